use crate::error::LedgerError;
use crate::storage_traits::{
    check_read_version, CommitBatch, MaterializedIterator, StateEntry, StateQueryIterator,
    Version, VersionedValue, WorldStateStore,
};
use anyhow::Context;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB,
};
use std::{
    fmt::Debug,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

// Column family names used to organize different types of data
const CF_WORLD_STATE: &str = "world_state";
const CF_LEDGER_META: &str = "ledger_meta";

const HEIGHT_KEY: &[u8] = b"height";

/// RocksDB implementation of the world state.
///
/// Values are stored inside a bincode [`VersionedValue`] envelope so the
/// version travels with the payload.
pub struct RocksDbStore {
    db: Arc<DB>,
    db_path: PathBuf,
    // Serializes read-set validation and the batch write that follows
    commit_lock: Mutex<()>,
}

impl RocksDbStore {
    /// Opens (creating if needed) a RocksDB store at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let db_path = path.as_ref().to_path_buf();

        // Set up database options
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        // Define column family descriptors
        let cf_world_state = ColumnFamilyDescriptor::new(CF_WORLD_STATE, Options::default());
        let cf_ledger_meta = ColumnFamilyDescriptor::new(CF_LEDGER_META, Options::default());

        let db = DB::open_cf_descriptors(&opts, &db_path, vec![cf_world_state, cf_ledger_meta])
            .with_context(|| format!("Failed to open RocksDB database at {:?}", db_path))?;

        log::info!("Opened RocksDB world state at {:?}", db_path);

        Ok(Self {
            db: Arc::new(db),
            db_path,
            commit_lock: Mutex::new(()),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, LedgerError> {
        self.db.cf_handle(name).ok_or_else(|| {
            LedgerError::Store(anyhow::anyhow!("Column family {} not found", name))
        })
    }

    fn decode(key: &str, bytes: &[u8]) -> Result<VersionedValue, LedgerError> {
        bincode::deserialize(bytes)
            .with_context(|| format!("Corrupt value envelope for key {}", key))
            .map_err(LedgerError::Store)
    }

    fn read_height(&self) -> Result<Version, LedgerError> {
        let cf_meta = self.cf(CF_LEDGER_META)?;
        match self
            .db
            .get_cf(cf_meta, HEIGHT_KEY)
            .context("Failed to read ledger height")?
        {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    LedgerError::Store(anyhow::anyhow!("Corrupt ledger height record"))
                })?;
                Ok(u64::from_le_bytes(raw))
            }
            None => Ok(0),
        }
    }
}

impl WorldStateStore for RocksDbStore {
    fn get_state(&self, key: &str) -> Result<Option<VersionedValue>, LedgerError> {
        let cf_state = self.cf(CF_WORLD_STATE)?;
        let bytes = self
            .db
            .get_cf(cf_state, key.as_bytes())
            .with_context(|| format!("Failed to read key {}", key))?;
        bytes.map(|bytes| Self::decode(key, &bytes)).transpose()
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Box<dyn StateQueryIterator + '_>, LedgerError> {
        let cf_state = self.cf(CF_WORLD_STATE)?;
        let mode = IteratorMode::From(prefix.as_bytes(), Direction::Forward);

        let mut entries = Vec::new();
        for item in self.db.iterator_cf(cf_state, mode) {
            let (raw_key, raw_value) =
                item.with_context(|| format!("Failed to scan prefix {:?}", prefix))?;
            if !raw_key.starts_with(prefix.as_bytes()) {
                break;
            }
            let key = String::from_utf8(raw_key.to_vec())
                .context("Non UTF-8 key in world state")?;
            let stored = Self::decode(&key, &raw_value)?;
            entries.push(StateEntry {
                key,
                value: stored.value,
            });
        }

        Ok(Box::new(MaterializedIterator::new(entries)))
    }

    fn commit(&self, batch: &CommitBatch) -> Result<Version, LedgerError> {
        let _guard = self
            .commit_lock
            .lock()
            .map_err(|e| LedgerError::Store(anyhow::anyhow!("Failed to acquire lock: {}", e)))?;

        for (key, observed) in &batch.read_set {
            let current = self.get_state(key)?.map(|stored| stored.version);
            check_read_version(key, *observed, current)?;
        }

        let height = self.read_height()?;
        if batch.is_read_only() {
            return Ok(height);
        }

        let version = height + 1;
        let cf_state = self.cf(CF_WORLD_STATE)?;
        let cf_meta = self.cf(CF_LEDGER_META)?;

        let mut write_batch = WriteBatch::default();
        for (key, value) in &batch.write_set {
            let envelope = bincode::serialize(&VersionedValue {
                value: value.clone(),
                version,
            })?;
            write_batch.put_cf(cf_state, key.as_bytes(), envelope);
        }
        write_batch.put_cf(cf_meta, HEIGHT_KEY, version.to_le_bytes());

        self.db
            .write(write_batch)
            .with_context(|| format!("Failed to commit tx {}", batch.tx_id))?;

        log::debug!(
            "Committed tx {} at height {} ({} writes)",
            batch.tx_id,
            version,
            batch.write_set.len()
        );
        Ok(version)
    }

    fn height(&self) -> Result<Version, LedgerError> {
        self.read_height()
    }
}

impl Debug for RocksDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}
