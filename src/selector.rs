//! Declarative record filters in the `{"selector": {...}}` query form.
//!
//! Only equality is supported: a field (or dotted path into nested objects)
//! must equal a JSON value. Selectors are built in code and rendered into
//! query-string form for logging.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A conjunction of field-equality conditions, optionally limited to keys
/// that start with a prefix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    fields: BTreeMap<String, Value>,
    key_prefix: Option<String>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the value at `path` to equal `value`
    pub fn field_equals(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(path.into(), value.into());
        self
    }

    /// Only consider records whose key starts with `prefix`
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn key_prefix(&self) -> &str {
        self.key_prefix.as_deref().unwrap_or("")
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(path, value)| (path.as_str(), value))
    }

    /// Render the selector back into query-string form
    pub fn to_query_string(&self) -> String {
        let mut selector = Map::new();
        for (path, value) in &self.fields {
            selector.insert(path.clone(), value.clone());
        }
        let mut root = Map::new();
        root.insert("selector".to_string(), Value::Object(selector));
        Value::Object(root).to_string()
    }

    /// Whether a stored record satisfies every condition
    pub fn matches(&self, key: &str, document: &Value) -> bool {
        if !key.starts_with(self.key_prefix()) {
            return false;
        }
        self.fields
            .iter()
            .all(|(path, expected)| lookup(document, path) == Some(expected))
    }

    /// Like [`Selector::matches`], for a raw payload. Payloads that are not
    /// JSON never match.
    pub fn matches_bytes(&self, key: &str, value: &[u8]) -> bool {
        match serde_json::from_slice::<Value>(value) {
            Ok(document) => self.matches(key, &document),
            Err(_) => {
                log::warn!("Skipping non-JSON record {} during selector query", key);
                false
            }
        }
    }
}

fn lookup<'v>(document: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.get(segment))
}
