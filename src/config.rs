use crate::error::LedgerError;
use crate::keys::KeyScheme;
use crate::storage::MemoryStore;
use crate::storage_traits::WorldStateStore;
use crate::validation::ValidationPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_mvcc_retries() -> u32 {
    3
}

/// Which world-state backend to open
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StoreConfig {
    #[default]
    Memory,
    Sqlite {
        path: PathBuf,
    },
    Rocksdb {
        path: PathBuf,
    },
}

/// Settings for a ledger runtime.
///
/// ```toml
/// key_scheme = "prefixed"
/// validation = "strict"
/// mvcc_retries = 5
///
/// [store]
/// backend = "sqlite"
/// path = "/var/lib/agri/world_state.db"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub store: StoreConfig,
    pub key_scheme: KeyScheme,
    pub validation: ValidationPolicy,
    #[serde(default = "default_mvcc_retries")]
    pub mvcc_retries: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            key_scheme: KeyScheme::default(),
            validation: ValidationPolicy::default(),
            mvcc_retries: default_mvcc_retries(),
        }
    }
}

impl LedgerConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, LedgerError> {
        toml::from_str(input)
            .map_err(|e| LedgerError::validation(format!("invalid ledger config: {}", e)))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Store(anyhow::anyhow!(
                "failed to read config {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Open the configured backend
    pub fn open_store(&self) -> Result<Box<dyn WorldStateStore>, LedgerError> {
        match &self.store {
            StoreConfig::Memory => Ok(Box::new(MemoryStore::new())),
            #[cfg(feature = "sqlite")]
            StoreConfig::Sqlite { path } => {
                log::info!("Opening SQLite world state at {}", path.display());
                Ok(Box::new(crate::storage::SqliteStore::new(path)?))
            }
            #[cfg(not(feature = "sqlite"))]
            StoreConfig::Sqlite { .. } => Err(LedgerError::validation(
                "the sqlite backend is not enabled in this build",
            )),
            #[cfg(feature = "rocksdb")]
            StoreConfig::Rocksdb { path } => {
                log::info!("Opening RocksDB world state at {}", path.display());
                Ok(Box::new(crate::storage::RocksDbStore::new(path)?))
            }
            #[cfg(not(feature = "rocksdb"))]
            StoreConfig::Rocksdb { .. } => Err(LedgerError::validation(
                "the rocksdb backend is not enabled in this build",
            )),
        }
    }
}
