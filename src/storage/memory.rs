use crate::error::LedgerError;
use crate::storage_traits::{
    check_read_version, CommitBatch, MaterializedIterator, StateEntry, StateQueryIterator,
    Version, VersionedValue, WorldStateStore,
};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<String, VersionedValue>,
    height: Version,
}

/// In-process world state, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, LedgerError> {
        self.state
            .lock()
            .map_err(|e| LedgerError::Store(anyhow::anyhow!("Failed to acquire lock: {}", e)))
    }
}

impl WorldStateStore for MemoryStore {
    fn get_state(&self, key: &str) -> Result<Option<VersionedValue>, LedgerError> {
        Ok(self.lock()?.entries.get(key).cloned())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Box<dyn StateQueryIterator + '_>, LedgerError> {
        let state = self.lock()?;
        let entries = state
            .entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, stored)| StateEntry {
                key: key.clone(),
                value: stored.value.clone(),
            })
            .collect();
        Ok(Box::new(MaterializedIterator::new(entries)))
    }

    fn commit(&self, batch: &CommitBatch) -> Result<Version, LedgerError> {
        let mut state = self.lock()?;

        for (key, observed) in &batch.read_set {
            let current = state.entries.get(key).map(|stored| stored.version);
            check_read_version(key, *observed, current)?;
        }

        if batch.is_read_only() {
            return Ok(state.height);
        }

        state.height += 1;
        let version = state.height;
        for (key, value) in &batch.write_set {
            state.entries.insert(
                key.clone(),
                VersionedValue {
                    value: value.clone(),
                    version,
                },
            );
        }

        log::debug!(
            "Committed tx {} at height {} ({} writes)",
            batch.tx_id,
            version,
            batch.write_set.len()
        );
        Ok(version)
    }

    fn height(&self) -> Result<Version, LedgerError> {
        Ok(self.lock()?.height)
    }
}
