use serde::{Deserialize, Serialize};
use std::fmt;

/// The three record kinds kept in world state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Product,
    Farmer,
    Certificate,
}

impl EntityKind {
    /// Key prefix used by [`KeyScheme::Prefixed`]
    pub fn prefix(&self) -> &'static str {
        match self {
            EntityKind::Product => "product:",
            EntityKind::Farmer => "farmer:",
            EntityKind::Certificate => "cert:",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Product => "product",
            EntityKind::Farmer => "farmer",
            EntityKind::Certificate => "certificate",
        };
        f.write_str(name)
    }
}

/// How entity ids map onto world-state keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyScheme {
    /// The key is the bare id. All kinds share one namespace, so callers
    /// must keep ids distinct across kinds. Matches records written by
    /// earlier deployments.
    Flat,
    /// The key is `<kind prefix><id>`
    #[default]
    Prefixed,
}

/// Derives storage keys for entities and ids for audit steps.
///
/// Pure and deterministic: the same inputs always produce the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyCodec {
    scheme: KeyScheme,
}

impl KeyCodec {
    pub fn new(scheme: KeyScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    /// World-state key for one entity instance
    pub fn entity_key(&self, kind: EntityKind, id: &str) -> String {
        match self.scheme {
            KeyScheme::Flat => id.to_string(),
            KeyScheme::Prefixed => format!("{}{}", kind.prefix(), id),
        }
    }

    /// Key prefix that every record of `kind` lives under, if the scheme
    /// separates kinds at all
    pub fn kind_prefix(&self, kind: EntityKind) -> Option<&'static str> {
        match self.scheme {
            KeyScheme::Flat => None,
            KeyScheme::Prefixed => Some(kind.prefix()),
        }
    }

    /// Recover the entity id from a key of the given kind
    pub fn entity_id<'k>(&self, kind: EntityKind, key: &'k str) -> Option<&'k str> {
        match self.scheme {
            KeyScheme::Flat => Some(key),
            KeyScheme::Prefixed => key.strip_prefix(kind.prefix()),
        }
    }
}

/// Id of the step appended at position `ordinal` of a product's sequence.
///
/// `ordinal` is the length of the sequence before the append. The format
/// is independent of the key scheme.
pub fn step_id(product_id: &str, ordinal: usize) -> String {
    format!("{}-{}", product_id, ordinal)
}
