pub mod accessor;
pub mod clock;
pub mod config;
pub mod context;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod keys;
pub mod model;
pub mod query;
pub mod runtime;
pub mod selector;
pub mod storage;
pub mod storage_traits;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-export the main types for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{LedgerConfig, StoreConfig};
pub use context::TxContext;
pub use contract::SupplyChainContract;
pub use dispatch::{invoke, ContractFunction};
pub use error::LedgerError;
pub use keys::{EntityKind, KeyCodec, KeyScheme};
pub use model::{Certificate, Farmer, Location, Product, ProductStatus, SupplyChainStep};
pub use runtime::{Invocation, InvocationReceipt, LedgerRuntime, TxId};
pub use selector::Selector;
pub use storage::MemoryStore;
pub use storage_traits::{
    CommitBatch, StateEntry, StateQueryIterator, Version, VersionedValue, WorldStateStore,
};
pub use validation::ValidationPolicy;

// Re-export the storage implementations
#[cfg(feature = "rocksdb")]
pub use storage::RocksDbStore;

#[cfg(feature = "sqlite")]
pub use storage::SqliteStore;
