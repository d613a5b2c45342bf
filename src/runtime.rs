use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::context::TxContext;
use crate::contract::SupplyChainContract;
use crate::dispatch::{invoke, ContractFunction};
use crate::error::LedgerError;
use crate::keys::KeyCodec;
use crate::storage_traits::{Version, WorldStateStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A transaction id uniquely identifies one execution attempt
pub type TxId = String;

/// A named function call with string-encoded arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// Name of the contract function to run
    pub function: String,

    /// Arguments, structured ones as JSON text
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<S: Into<String>>(function: &str, args: impl IntoIterator<Item = S>) -> Self {
        Self {
            function: function.to_string(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

/// Result of a committed invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationReceipt {
    /// Id of the attempt that committed
    pub tx_id: TxId,

    /// The function that ran
    pub function: String,

    /// Timestamp every record write of the transaction carries
    pub timestamp: DateTime<Utc>,

    /// Commit height assigned by the store
    pub height: Version,

    /// JSON result, empty for write-only functions
    pub payload: String,
}

/// Executes invocations against a world-state store.
///
/// Each invocation gets its own [`TxContext`]. `submit` commits the
/// context's writes if and only if the function succeeds; a commit rejected
/// for a stale read is re-executed from scratch up to `mvcc_retries` times.
pub struct LedgerRuntime {
    store: Box<dyn WorldStateStore>,
    clock: Arc<dyn Clock>,
    contract: SupplyChainContract,
    keys: KeyCodec,
    mvcc_retries: u32,
    nonce: AtomicU64,
}

impl LedgerRuntime {
    pub fn new(
        store: Box<dyn WorldStateStore>,
        clock: Arc<dyn Clock>,
        config: &LedgerConfig,
    ) -> Self {
        Self {
            store,
            clock,
            contract: SupplyChainContract::new(config.validation),
            keys: KeyCodec::new(config.key_scheme),
            mvcc_retries: config.mvcc_retries,
            nonce: AtomicU64::new(0),
        }
    }

    /// Open the configured store and run on the system clock
    pub fn from_config(config: &LedgerConfig) -> Result<Self, LedgerError> {
        let store = config.open_store()?;
        Ok(Self::new(store, Arc::new(SystemClock), config))
    }

    pub fn store(&self) -> &dyn WorldStateStore {
        self.store.as_ref()
    }

    fn next_tx_id(&self, invocation: &Invocation, timestamp: DateTime<Utc>) -> TxId {
        let nonce = self.nonce.fetch_add(1, Ordering::Relaxed);
        let mut hasher = Sha256::new();
        hasher.update(invocation.function.as_bytes());
        for arg in &invocation.args {
            hasher.update((arg.len() as u64).to_le_bytes());
            hasher.update(arg.as_bytes());
        }
        hasher.update(timestamp.to_rfc3339().as_bytes());
        hasher.update(nonce.to_le_bytes());
        hex::encode(hasher.finalize())
    }

    fn begin(&self, invocation: &Invocation) -> TxContext<'_> {
        let timestamp = self.clock.now();
        let tx_id = self.next_tx_id(invocation, timestamp);
        TxContext::new(self.store.as_ref(), self.keys, tx_id, timestamp)
    }

    /// Execute an invocation and commit its writes
    pub fn submit(&self, invocation: &Invocation) -> Result<InvocationReceipt, LedgerError> {
        let function: ContractFunction = invocation.function.parse()?;
        let mut attempt = 0;

        loop {
            let mut ctx = self.begin(invocation);
            let tx_id = ctx.tx_id().to_string();
            let timestamp = ctx.timestamp();

            let args = invocation.args.as_slice();
            let payload = match invoke(&self.contract, &mut ctx, function, args) {
                Ok(payload) => payload,
                Err(e) => {
                    log::debug!("{} failed in tx {}: {}", function, tx_id, e);
                    return Err(e);
                }
            };

            match self.store.commit(&ctx.into_commit_batch()) {
                Ok(height) => {
                    return Ok(InvocationReceipt {
                        tx_id,
                        function: function.name().to_string(),
                        timestamp,
                        height,
                        payload,
                    })
                }
                Err(e) if e.is_retryable() && attempt < self.mvcc_retries => {
                    attempt += 1;
                    log::warn!(
                        "{} tx {} lost a read conflict ({}), retrying ({}/{})",
                        function,
                        tx_id,
                        e,
                        attempt,
                        self.mvcc_retries
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Execute an invocation without committing anything
    pub fn evaluate(&self, invocation: &Invocation) -> Result<String, LedgerError> {
        let function: ContractFunction = invocation.function.parse()?;
        let mut ctx = self.begin(invocation);
        invoke(&self.contract, &mut ctx, function, invocation.args.as_slice())
    }

    /// Submit a function by name
    pub fn submit_fn(
        &self,
        function: &str,
        args: &[&str],
    ) -> Result<InvocationReceipt, LedgerError> {
        self.submit(&Invocation::new(function, args.iter().copied()))
    }

    /// Evaluate a function by name
    pub fn evaluate_fn(&self, function: &str, args: &[&str]) -> Result<String, LedgerError> {
        self.evaluate(&Invocation::new(function, args.iter().copied()))
    }
}
