//! Opaque scan bookmarks.
//!
//! A bookmark is the hex encoding of the last key a scan delivered. Callers
//! only ever echo it back, so the encoding is free to change as long as
//! [`encode`] and [`decode`] agree.

use crate::StorageError;

/// Encode the key a scan stopped at.
pub fn encode(key: &str) -> String {
    hex::encode(key.as_bytes())
}

/// Decode a bookmark back into the key to resume from. Empty means "from the start".
pub fn decode(bookmark: &str) -> Result<Option<String>, StorageError> {
    if bookmark.is_empty() {
        return Ok(None);
    }
    let bytes = hex::decode(bookmark).map_err(|_| StorageError::InvalidBookmark {
        bookmark: bookmark.to_string(),
    })?;
    let key = String::from_utf8(bytes).map_err(|_| StorageError::InvalidBookmark {
        bookmark: bookmark.to_string(),
    })?;
    Ok(Some(key))
}

/// Inclusive lower and exclusive upper key bounds for one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScanBounds {
    pub lower: String,
    pub upper: Option<String>,
}

impl ScanBounds {
    /// Combine the requested range with the resume point. A bookmark before
    /// `start_key` never widens the range.
    pub fn resolve(start_key: &str, end_key: &str, bookmark: &str) -> Result<Self, StorageError> {
        let lower = match decode(bookmark)? {
            Some(resume) if resume.as_str() > start_key => resume,
            _ => start_key.to_string(),
        };
        let upper = (!end_key.is_empty()).then(|| end_key.to_string());
        Ok(Self { lower, upper })
    }

    /// True when no key can satisfy the bounds.
    pub fn is_empty(&self) -> bool {
        matches!(&self.upper, Some(upper) if self.lower >= *upper)
    }
}
