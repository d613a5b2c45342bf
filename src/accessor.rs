//! Typed reads and writes of entity records.
//!
//! Records are stored as JSON with the field names defined in
//! [`crate::model`]. Keys come from the context's [`crate::keys::KeyCodec`].

use crate::context::TxContext;
use crate::error::LedgerError;
use crate::keys::EntityKind;
use serde::de::DeserializeOwned;
use serde::Serialize;

impl TxContext<'_> {
    /// Read and decode one record. A missing record is `Ok(None)`; a record
    /// that does not decode is a `Validation` error.
    pub fn read_entity<T: DeserializeOwned>(
        &mut self,
        kind: EntityKind,
        id: &str,
    ) -> Result<Option<T>, LedgerError> {
        let key = self.keys().entity_key(kind, id);
        match self.get_state(&key)? {
            Some(bytes) => decode_entity(kind, id, &bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Like [`TxContext::read_entity`], but absence is a `NotFound` error
    pub fn load_entity<T: DeserializeOwned>(
        &mut self,
        kind: EntityKind,
        id: &str,
    ) -> Result<T, LedgerError> {
        self.read_entity(kind, id)?
            .ok_or_else(|| LedgerError::not_found(kind, id))
    }

    /// Encode a record and buffer it for commit
    pub fn write_entity<T: Serialize>(
        &mut self,
        kind: EntityKind,
        id: &str,
        entity: &T,
    ) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec(entity).map_err(|e| {
            LedgerError::validation(format!("failed to marshal {} {}: {}", kind, id, e))
        })?;
        let key = self.keys().entity_key(kind, id);
        self.put_state(&key, bytes)
    }

    /// Whether a record of this kind and id is present
    pub fn entity_exists(&mut self, kind: EntityKind, id: &str) -> Result<bool, LedgerError> {
        let key = self.keys().entity_key(kind, id);
        Ok(self.get_state(&key)?.is_some())
    }
}

/// Decode a stored payload, naming the record in the error
pub fn decode_entity<T: DeserializeOwned>(
    kind: EntityKind,
    id: &str,
    bytes: &[u8],
) -> Result<T, LedgerError> {
    serde_json::from_slice(bytes).map_err(|e| {
        LedgerError::validation(format!("failed to unmarshal {} {}: {}", kind, id, e))
    })
}
