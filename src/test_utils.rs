//! Fixtures shared by the unit tests.

use crate::model::{Farmer, Location, Product};
use crate::storage_traits::{CommitBatch, WorldStateStore};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fixed instant the tests hand to transactions
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
}

/// Write a raw value straight into a store, bypassing the state machine
pub fn seed(store: &dyn WorldStateStore, key: &str, value: &str) {
    store
        .commit(&CommitBatch {
            tx_id: format!("seed-{}", key),
            read_set: Vec::new(),
            write_set: vec![(key.to_string(), value.as_bytes().to_vec())],
        })
        .unwrap();
}

/// A product payload as a client would submit it
pub fn product_json(id: &str, farmer_id: &str) -> String {
    json!({
        "id": id,
        "name": "Organic Basmati Rice",
        "batchNumber": format!("BATCH-{}", id),
        "farmerID": farmer_id,
        "farmLocation": {"latitude": 30.9, "longitude": 75.8, "address": "Ludhiana, Punjab"},
        "plantingDate": "2024-01-10T00:00:00Z",
        "harvestDate": "2024-05-20T00:00:00Z",
        "quality": "A",
        "certifications": ["C-ORG-1"],
        "currentOwner": farmer_id,
        "currentLocation": {"latitude": 30.9, "longitude": 75.8, "address": "Ludhiana, Punjab"},
        "status": "PLANTED",
        "ipfsHash": "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG",
        "qrCode": format!("qr/{}", id)
    })
    .to_string()
}

pub fn sample_product(id: &str, farmer_id: &str) -> Product {
    serde_json::from_str(&product_json(id, farmer_id)).unwrap()
}

pub fn sample_farmer(id: &str) -> Farmer {
    Farmer {
        id: id.to_string(),
        name: "Asha Kumari".to_string(),
        email: "asha@example.com".to_string(),
        phone: "+91 98765 43210".to_string(),
        farm_location: Location {
            latitude: 30.9,
            longitude: 75.8,
            address: "Ludhiana, Punjab".to_string(),
        },
        certifications: vec!["C-ORG-1".to_string()],
        verified: true,
        metadata: Default::default(),
        created_at: fixed_time(),
    }
}
