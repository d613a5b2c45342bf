use crate::error::LedgerError;
use crate::keys::KeyCodec;
use crate::selector::Selector;
use crate::storage_traits::{CommitBatch, StateQueryIterator, Version, WorldStateStore};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A transaction-scoped view of world state.
///
/// Reads go to the store (or to this transaction's own pending writes) and
/// are recorded with the version seen. Writes are buffered until the
/// runtime turns the context into a [`CommitBatch`]. Nothing reaches the
/// store if the context is dropped instead.
pub struct TxContext<'a> {
    store: &'a dyn WorldStateStore,
    keys: KeyCodec,
    tx_id: String,
    timestamp: DateTime<Utc>,
    read_set: BTreeMap<String, Option<Version>>,
    write_set: BTreeMap<String, Vec<u8>>,
}

impl<'a> TxContext<'a> {
    pub fn new(
        store: &'a dyn WorldStateStore,
        keys: KeyCodec,
        tx_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            keys,
            tx_id: tx_id.into(),
            timestamp,
            read_set: BTreeMap::new(),
            write_set: BTreeMap::new(),
        }
    }

    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// The transaction's timestamp, taken from the clock when it started
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn keys(&self) -> &KeyCodec {
        &self.keys
    }

    /// Raw read of a key. A missing key is `Ok(None)`, not an error.
    pub fn get_state(&mut self, key: &str) -> Result<Option<Vec<u8>>, LedgerError> {
        if let Some(pending) = self.write_set.get(key) {
            return Ok(Some(pending.clone()));
        }

        let stored = self.store.get_state(key)?;
        // Keep the first version observed; a later read must not mask a
        // concurrent change made between the two
        self.read_set
            .entry(key.to_string())
            .or_insert_with(|| stored.as_ref().map(|s| s.version));
        Ok(stored.map(|s| s.value))
    }

    /// Buffer a write. The last write to a key within a transaction wins.
    pub fn put_state(&mut self, key: &str, value: Vec<u8>) -> Result<(), LedgerError> {
        if key.is_empty() {
            return Err(LedgerError::validation("key must not be an empty string"));
        }
        self.write_set.insert(key.to_string(), value);
        Ok(())
    }

    /// Run a selector query against committed state.
    ///
    /// Results are not recorded in the read-set and do not include this
    /// transaction's pending writes.
    pub fn get_query_result(
        &self,
        selector: &Selector,
    ) -> Result<Box<dyn StateQueryIterator + 'a>, LedgerError> {
        self.store.query_selector(selector)
    }

    pub fn has_writes(&self) -> bool {
        !self.write_set.is_empty()
    }

    /// Consume the context into the batch the store must validate and apply
    pub fn into_commit_batch(self) -> CommitBatch {
        CommitBatch {
            tx_id: self.tx_id,
            read_set: self.read_set.into_iter().collect(),
            write_set: self.write_set.into_iter().collect(),
        }
    }
}
