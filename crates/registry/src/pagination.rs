//! Lookahead-by-one page assembly.
//!
//! A page of `n` layers is served by asking the store for `n + 1`. If the
//! extra record arrives there is more to read: its id becomes the page's
//! `next_page_id` and the record itself is dropped. This needs no count query
//! and works over any store whose scan is resumable.

use crate::errors::{RegistryError, Result};
use layer_ledger_types::{Layer, Page};

/// Number of records to request from the store for a page of `page_size`.
pub fn lookahead(page_size: usize) -> Result<usize> {
    page_size
        .checked_add(1)
        .ok_or_else(|| RegistryError::InvalidArgument(format!("page size too large: {page_size}")))
}

/// Build the page returned to the caller from one decoded scan.
///
/// `scanned` must be at most `page_size + 1` layers in store order and
/// `bookmark` the cursor the store returned for that scan.
pub fn assemble_page(mut scanned: Vec<Layer>, page_size: usize, bookmark: String) -> Page {
    let next_page_id = if scanned.len() > page_size {
        scanned.truncate(page_size + 1);
        scanned.pop().map(|extra| extra.id)
    } else {
        None
    };

    Page {
        page_size: scanned.len(),
        items: scanned,
        page_id: bookmark,
        next_page_id,
    }
}
