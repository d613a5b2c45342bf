use crate::error::LedgerError;
use crate::selector::Selector;
use serde::{Deserialize, Serialize};

/// Commit height at which a key was last written
pub type Version = u64;

/// A stored value together with the version that wrote it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    pub value: Vec<u8>,
    pub version: Version,
}

/// One (key, value) pair yielded by a scan or query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub key: String,
    pub value: Vec<u8>,
}

/// Iterator over query results.
///
/// Backend resources held by an iterator are released when it is dropped,
/// whether it was drained or abandoned part-way.
pub trait StateQueryIterator: Iterator<Item = Result<StateEntry, LedgerError>> {}

/// Results materialized up front, handed out in backend order
pub struct MaterializedIterator {
    entries: Vec<StateEntry>,
    current_index: usize,
}

impl MaterializedIterator {
    pub fn new(entries: Vec<StateEntry>) -> Self {
        Self {
            entries,
            current_index: 0,
        }
    }
}

impl Iterator for MaterializedIterator {
    type Item = Result<StateEntry, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index < self.entries.len() {
            let entry = self.entries[self.current_index].clone();
            self.current_index += 1;
            Some(Ok(entry))
        } else {
            None
        }
    }
}

impl StateQueryIterator for MaterializedIterator {}

/// Wraps a scan and keeps only the entries a selector accepts
pub struct SelectorFilterIterator<'a> {
    inner: Box<dyn StateQueryIterator + 'a>,
    selector: Selector,
}

impl<'a> SelectorFilterIterator<'a> {
    pub fn new(inner: Box<dyn StateQueryIterator + 'a>, selector: Selector) -> Self {
        Self { inner, selector }
    }
}

impl Iterator for SelectorFilterIterator<'_> {
    type Item = Result<StateEntry, LedgerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) if self.selector.matches_bytes(&entry.key, &entry.value) => {
                    return Some(Ok(entry))
                }
                Ok(_) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl StateQueryIterator for SelectorFilterIterator<'_> {}

/// Everything one transaction wants to make durable
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitBatch {
    /// Transaction that produced the batch
    pub tx_id: String,

    /// Keys the transaction read, with the version it saw (`None` when the
    /// key was absent)
    pub read_set: Vec<(String, Option<Version>)>,

    /// Keys to write, with their new values
    pub write_set: Vec<(String, Vec<u8>)>,
}

impl CommitBatch {
    pub fn is_read_only(&self) -> bool {
        self.write_set.is_empty()
    }
}

/// The key-value world state the ledger runs against.
///
/// Implementations must make `commit` all-or-nothing and must reject a batch
/// whose read-set no longer matches current versions. The step-ordinal
/// scheme depends on this: two transactions appending to the same product
/// both read its record, and only the first to commit may succeed.
pub trait WorldStateStore: Send + Sync {
    /// Get the current value of a key
    ///
    /// # Returns
    /// Some(value) if the key is present, None otherwise
    fn get_state(&self, key: &str) -> Result<Option<VersionedValue>, LedgerError>;

    /// Iterate every entry whose key starts with `prefix`, in key order
    fn scan_prefix(&self, prefix: &str) -> Result<Box<dyn StateQueryIterator + '_>, LedgerError>;

    /// Run a selector query
    ///
    /// The default implementation scans the selector's key prefix and
    /// filters each record. Backends with a native query engine override it.
    fn query_selector(
        &self,
        selector: &Selector,
    ) -> Result<Box<dyn StateQueryIterator + '_>, LedgerError> {
        let scan = self.scan_prefix(selector.key_prefix())?;
        Ok(Box::new(SelectorFilterIterator::new(scan, selector.clone())))
    }

    /// Validate the batch's read-set and apply its writes atomically
    ///
    /// # Returns
    /// The commit height assigned to the batch
    fn commit(&self, batch: &CommitBatch) -> Result<Version, LedgerError>;

    /// Height of the latest commit, zero for an empty store
    fn height(&self) -> Result<Version, LedgerError>;
}

/// Compare a read-set entry with the version currently stored
pub fn check_read_version(
    key: &str,
    observed: Option<Version>,
    current: Option<Version>,
) -> Result<(), LedgerError> {
    if observed == current {
        Ok(())
    } else {
        Err(LedgerError::ReadConflict {
            key: key.to_string(),
        })
    }
}
