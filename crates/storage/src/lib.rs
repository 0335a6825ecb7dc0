//! Ordered key-value state for the layer ledger.
//!
//! [`StateStore`] is the only surface the registry sees: point reads, point
//! writes and a bookmark-resumable range scan. Two backends are provided, a
//! sled tree for real ledgers and a `BTreeMap` for tests. Both order keys
//! byte-wise, so a scan returns the same sequence from either.

use parking_lot::RwLock;
use sled::{Db, Tree};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

pub mod bookmark;

use bookmark::ScanBounds;

/// Tree used when a ledger is opened without naming one.
pub const DEFAULT_TREE: &str = "layers";

/// Storage errors
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Invalid bookmark: {bookmark}")]
    InvalidBookmark { bookmark: String },
    #[error("Stored record under {key} is not valid UTF-8")]
    CorruptValue { key: String },
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// One record delivered by a range scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

/// Records delivered by one range scan and the bookmark to resume it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangePage {
    pub records: Vec<KeyValue>,
    pub bookmark: String,
}

impl RangePage {
    /// The bookmark names the last delivered key, or repeats the incoming
    /// bookmark when nothing was delivered.
    fn from_records(records: Vec<KeyValue>, resumed_from: &str) -> Self {
        let bookmark = records
            .last()
            .map(|kv| bookmark::encode(&kv.key))
            .unwrap_or_else(|| resumed_from.to_string());
        Self { records, bookmark }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Abstract ledger state accessor
pub trait StateStore {
    /// Point lookup. `None` is distinct from an empty value.
    fn get_state(&self, key: &str) -> Result<Option<String>>;

    /// Point write, overwriting any previous value.
    fn put_state(&self, key: &str, value: &str) -> Result<()>;

    /// Scan `[start_key, end_key)` in key order, at most `page_size` records.
    ///
    /// Empty keys leave that side unbounded. A non-empty `bookmark` resumes
    /// the scan at the key it names, inclusive.
    fn get_state_by_range_with_pagination(
        &self,
        start_key: &str,
        end_key: &str,
        page_size: usize,
        bookmark: &str,
    ) -> Result<RangePage>;
}

/// Sled-backed implementation
#[derive(Clone)]
pub struct SledStateStore {
    db: Db,
    tree: Tree,
}

impl SledStateStore {
    /// Open (or create) the ledger at `path` using [`DEFAULT_TREE`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_tree(path, DEFAULT_TREE)
    }

    pub fn open_tree<P: AsRef<Path>>(path: P, tree: &str) -> Result<Self> {
        let db = sled::open(path.as_ref())?;
        let tree = db.open_tree(tree)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            records = tree.len(),
            "Opened ledger state"
        );
        Ok(Self { db, tree })
    }

    /// Throwaway ledger removed when dropped.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        let tree = db.open_tree(DEFAULT_TREE)?;
        Ok(Self { db, tree })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

fn utf8(key: &[u8], bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec()).map_err(|_| StorageError::CorruptValue {
        key: String::from_utf8_lossy(key).into_owned(),
    })
}

impl StateStore for SledStateStore {
    fn get_state(&self, key: &str) -> Result<Option<String>> {
        self.tree
            .get(key.as_bytes())?
            .map(|v| utf8(key.as_bytes(), &v))
            .transpose()
    }

    fn put_state(&self, key: &str, value: &str) -> Result<()> {
        self.tree.insert(key.as_bytes(), value.as_bytes())?;
        Ok(())
    }

    fn get_state_by_range_with_pagination(
        &self,
        start_key: &str,
        end_key: &str,
        page_size: usize,
        bookmark: &str,
    ) -> Result<RangePage> {
        let bounds = ScanBounds::resolve(start_key, end_key, bookmark)?;
        if page_size == 0 || bounds.is_empty() {
            return Ok(RangePage::from_records(Vec::new(), bookmark));
        }

        let lower = Bound::Included(bounds.lower.as_bytes());
        let upper = match &bounds.upper {
            Some(upper) => Bound::Excluded(upper.as_bytes()),
            None => Bound::Unbounded,
        };

        let mut records = Vec::new();
        for item in self.tree.range::<&[u8], _>((lower, upper)).take(page_size) {
            let (key, value) = item?;
            records.push(KeyValue {
                key: utf8(&key, &key)?,
                value: utf8(&key, &value)?,
            });
        }
        Ok(RangePage::from_records(records, bookmark))
    }
}

/// In-memory testing backend
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    state: Arc<RwLock<BTreeMap<String, String>>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }
}

impl StateStore for MemoryStateStore {
    fn get_state(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.read().get(key).cloned())
    }

    fn put_state(&self, key: &str, value: &str) -> Result<()> {
        self.state.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get_state_by_range_with_pagination(
        &self,
        start_key: &str,
        end_key: &str,
        page_size: usize,
        bookmark: &str,
    ) -> Result<RangePage> {
        let bounds = ScanBounds::resolve(start_key, end_key, bookmark)?;
        if page_size == 0 || bounds.is_empty() {
            return Ok(RangePage::from_records(Vec::new(), bookmark));
        }

        let lower = Bound::Included(bounds.lower.as_str());
        let upper = match &bounds.upper {
            Some(upper) => Bound::Excluded(upper.as_str()),
            None => Bound::Unbounded,
        };

        let records = self
            .state
            .read()
            .range::<str, _>((lower, upper))
            .take(page_size)
            .map(|(key, value)| KeyValue {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        Ok(RangePage::from_records(records, bookmark))
    }
}
