use crate::keys::EntityKind;
use thiserror::Error;

/// Represents all possible errors that can occur when operating on the ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Malformed caller input, or a stored payload that no longer parses
    #[error("Validation error: {0}")]
    Validation(String),

    /// Creation of an id that must be unique but is already present
    #[error("{kind} {id} already exists")]
    Conflict { kind: EntityKind, id: String },

    /// Read of an absent key
    #[error("{kind} {id} does not exist")]
    NotFound { kind: EntityKind, id: String },

    /// Selector query failed or the backend cannot run it
    #[error("Query error: {0}")]
    Query(String),

    /// A key in the read-set was rewritten by another commit
    #[error("Read conflict on key {key}: version changed since it was read")]
    ReadConflict { key: String },

    /// Backend I/O failure, opaque to the state machine
    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }

    pub fn not_found(kind: EntityKind, id: &str) -> Self {
        LedgerError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn conflict(kind: EntityKind, id: &str) -> Self {
        LedgerError::Conflict {
            kind,
            id: id.to_string(),
        }
    }

    /// Re-classify a backend failure that happened while serving a query
    pub fn into_query_error(self) -> Self {
        match self {
            LedgerError::Store(e) => LedgerError::Query(format!("{:#}", e)),
            other => other,
        }
    }

    /// Whether the runtime may re-execute the invocation
    pub fn is_retryable(&self) -> bool {
        matches!(self, LedgerError::ReadConflict { .. })
    }
}

// Additional From conversions for common error types

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::Store(anyhow::Error::new(err).context("bincode envelope"))
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        LedgerError::Store(err.into())
    }
}

#[cfg(feature = "rocksdb")]
impl From<rocksdb::Error> for LedgerError {
    fn from(err: rocksdb::Error) -> Self {
        LedgerError::Store(err.into())
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Store(err.into())
    }
}
