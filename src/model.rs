//! Record formats persisted in world state.
//!
//! Field names are part of the stored format and must not change: records
//! written by earlier deployments are read back through these types. Those
//! records may carry `null` for any field and free-form status strings, so
//! every field reads `null` as its empty value.

use crate::error::LedgerError;
use crate::keys::step_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Seconds between 0001-01-01T00:00:00Z and the Unix epoch
const ZERO_TIME_UNIX_SECS: i64 = -62_135_596_800;

/// The timestamp stored for a time that was never set
pub fn zero_time() -> DateTime<Utc> {
    DateTime::from_timestamp(ZERO_TIME_UNIX_SECS, 0).unwrap_or_default()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_zero_time<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<DateTime<Utc>>::deserialize(deserializer)?.unwrap_or_else(zero_time))
}

/// Geographical position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "null_as_default")]
    pub latitude: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub longitude: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
}

/// Lifecycle status of a product.
///
/// Only the six named statuses are accepted as new input (see
/// [`ProductStatus::from_str`]). Stored records may hold any string;
/// those read back as [`ProductStatus::Unrecognized`] and are written out
/// unchanged. An empty or `null` status reads as `PLANTED`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ProductStatus {
    #[default]
    Planted,
    Harvested,
    Processed,
    InTransit,
    Delivered,
    Sold,
    Unrecognized(String),
}

impl ProductStatus {
    pub const ALL: [ProductStatus; 6] = [
        ProductStatus::Planted,
        ProductStatus::Harvested,
        ProductStatus::Processed,
        ProductStatus::InTransit,
        ProductStatus::Delivered,
        ProductStatus::Sold,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            ProductStatus::Planted => "PLANTED",
            ProductStatus::Harvested => "HARVESTED",
            ProductStatus::Processed => "PROCESSED",
            ProductStatus::InTransit => "IN_TRANSIT",
            ProductStatus::Delivered => "DELIVERED",
            ProductStatus::Sold => "SOLD",
            ProductStatus::Unrecognized(status) => status,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ProductStatus::Unrecognized(_))
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProductStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| LedgerError::validation(format!("unknown product status {:?}", s)))
    }
}

impl Serialize for ProductStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProductStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(ProductStatus::default()),
            Some(status) if status.is_empty() => Ok(ProductStatus::default()),
            Some(status) => Ok(status
                .parse()
                .unwrap_or(ProductStatus::Unrecognized(status))),
        }
    }
}

/// One custody or status event in a product's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyChainStep {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "stepType", deserialize_with = "null_as_default")]
    pub step_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub actor: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: Location,
    #[serde(default = "zero_time", deserialize_with = "null_as_zero_time")]
    pub timestamp: DateTime<Utc>,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: BTreeMap<String, String>,
}

impl Default for SupplyChainStep {
    fn default() -> Self {
        Self {
            id: String::new(),
            step_type: String::new(),
            actor: String::new(),
            location: Location::default(),
            timestamp: zero_time(),
            description: String::new(),
            metadata: BTreeMap::new(),
        }
    }
}

/// An agricultural product tracked through the supply chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "batchNumber", default, deserialize_with = "null_as_default")]
    pub batch_number: String,
    #[serde(rename = "farmerID", default, deserialize_with = "null_as_default")]
    pub farmer_id: String,
    #[serde(rename = "farmLocation", default, deserialize_with = "null_as_default")]
    pub farm_location: Location,
    #[serde(
        rename = "plantingDate",
        default = "zero_time",
        deserialize_with = "null_as_zero_time"
    )]
    pub planting_date: DateTime<Utc>,
    #[serde(
        rename = "harvestDate",
        default = "zero_time",
        deserialize_with = "null_as_zero_time"
    )]
    pub harvest_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quality: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub certifications: Vec<String>,
    #[serde(rename = "currentOwner", default, deserialize_with = "null_as_default")]
    pub current_owner: String,
    #[serde(rename = "currentLocation", default, deserialize_with = "null_as_default")]
    pub current_location: Location,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(
        rename = "supplyChainSteps",
        default,
        deserialize_with = "null_as_default"
    )]
    pub supply_chain_steps: Vec<SupplyChainStep>,
    #[serde(rename = "ipfsHash", default, deserialize_with = "null_as_default")]
    pub ipfs_hash: String,
    #[serde(rename = "qrCode", default, deserialize_with = "null_as_default")]
    pub qr_code: String,
    #[serde(
        rename = "createdAt",
        default = "zero_time",
        deserialize_with = "null_as_zero_time"
    )]
    pub created_at: DateTime<Utc>,
    #[serde(
        rename = "updatedAt",
        default = "zero_time",
        deserialize_with = "null_as_zero_time"
    )]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Ordinal the next appended step will receive
    pub fn next_ordinal(&self) -> usize {
        self.supply_chain_steps.len()
    }

    /// Append a step, assigning its id and timestamp.
    ///
    /// The sequence is only ever extended; existing steps are untouched.
    pub fn append_step(&mut self, mut step: SupplyChainStep, timestamp: DateTime<Utc>) {
        step.id = step_id(&self.id, self.next_ordinal());
        step.timestamp = timestamp;
        self.supply_chain_steps.push(step);
    }

    /// Move `updated_at` forward to `now`, never backwards
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// A quality or organic certification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "productID", default, deserialize_with = "null_as_default")]
    pub product_id: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub cert_type: String,
    #[serde(rename = "issuedBy", default, deserialize_with = "null_as_default")]
    pub issued_by: String,
    #[serde(
        rename = "issuedDate",
        default = "zero_time",
        deserialize_with = "null_as_zero_time"
    )]
    pub issued_date: DateTime<Utc>,
    #[serde(
        rename = "validUntil",
        default = "zero_time",
        deserialize_with = "null_as_zero_time"
    )]
    pub valid_until: DateTime<Utc>,
    #[serde(rename = "ipfsHash", default, deserialize_with = "null_as_default")]
    pub ipfs_hash: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
}

/// A farmer profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Farmer {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(rename = "farmLocation", default, deserialize_with = "null_as_default")]
    pub farm_location: Location,
    #[serde(default, deserialize_with = "null_as_default")]
    pub certifications: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub verified: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metadata: BTreeMap<String, String>,
    #[serde(
        rename = "createdAt",
        default = "zero_time",
        deserialize_with = "null_as_zero_time"
    )]
    pub created_at: DateTime<Utc>,
}
