//! Transition rules for products, farmers and certificates.
//!
//! Every operation runs inside one [`TxContext`]: it reads what it needs,
//! checks its invariants and buffers at most one record write. The runtime
//! commits that write or discards it, so a failed operation leaves no trace.

use crate::accessor::decode_entity;
use crate::context::TxContext;
use crate::error::LedgerError;
use crate::keys::EntityKind;
use crate::model::{Certificate, Farmer, Location, Product, ProductStatus, SupplyChainStep};
use crate::validation::{check_id, ValidationPolicy};
use serde::de::DeserializeOwned;

/// The agricultural supply chain state machine
#[derive(Debug, Clone, Copy, Default)]
pub struct SupplyChainContract {
    validation: ValidationPolicy,
}

fn parse_payload<T: DeserializeOwned>(what: &str, data: &str) -> Result<T, LedgerError> {
    serde_json::from_str(data)
        .map_err(|e| LedgerError::validation(format!("failed to unmarshal {} data: {}", what, e)))
}

impl SupplyChainContract {
    pub fn new(validation: ValidationPolicy) -> Self {
        Self { validation }
    }

    pub fn validation(&self) -> ValidationPolicy {
        self.validation
    }

    /// One-time ledger setup. Seeds nothing.
    pub fn init_ledger(&self, ctx: &mut TxContext) -> Result<(), LedgerError> {
        log::info!(
            "Initializing agriculture supply chain ledger (tx {})",
            ctx.tx_id()
        );
        Ok(())
    }

    /// Create a product from its JSON payload. Fails if the id is taken.
    pub fn create_product(
        &self,
        ctx: &mut TxContext,
        product_data: &str,
    ) -> Result<(), LedgerError> {
        let mut product: Product = parse_payload("product", product_data)?;
        self.validation.check_product(&product)?;

        if self.product_exists(ctx, &product.id)? {
            return Err(LedgerError::conflict(EntityKind::Product, &product.id));
        }

        let now = ctx.timestamp();
        product.created_at = now;
        product.updated_at = now;

        log::debug!("Creating product {}", product.id);
        ctx.write_entity(EntityKind::Product, &product.id, &product)
    }

    pub fn get_product(
        &self,
        ctx: &mut TxContext,
        product_id: &str,
    ) -> Result<Product, LedgerError> {
        ctx.load_entity(EntityKind::Product, product_id)
    }

    /// Set a product's status, location and owner, and log the change as a
    /// new step.
    ///
    /// An empty `location` resets the current location to the zero
    /// location rather than keeping the previous one.
    pub fn update_product_status(
        &self,
        ctx: &mut TxContext,
        product_id: &str,
        status: &str,
        location: &str,
        actor: &str,
    ) -> Result<(), LedgerError> {
        let mut product = self.get_product(ctx, product_id)?;
        let status: ProductStatus = status.parse()?;

        let location = if location.is_empty() {
            Location::default()
        } else {
            serde_json::from_str::<Option<Location>>(location)
                .map_err(|e| LedgerError::validation(format!("failed to parse location: {}", e)))?
                .unwrap_or_default()
        };

        let now = ctx.timestamp();
        product.status = status.clone();
        product.current_location = location.clone();
        product.current_owner = actor.to_string();
        product.touch(now);

        product.append_step(
            SupplyChainStep {
                step_type: status.to_string(),
                actor: actor.to_string(),
                location,
                description: format!("Product status updated to {}", status),
                ..SupplyChainStep::default()
            },
            now,
        );

        log::debug!(
            "Product {} moved to {} by {} (step {})",
            product_id,
            status,
            actor,
            product.next_ordinal() - 1
        );
        ctx.write_entity(EntityKind::Product, product_id, &product)
    }

    /// Append a caller-described step. Status, owner and location are left
    /// alone; the step's id and timestamp are always assigned here.
    pub fn add_supply_chain_step(
        &self,
        ctx: &mut TxContext,
        product_id: &str,
        step_data: &str,
    ) -> Result<(), LedgerError> {
        let mut product = self.get_product(ctx, product_id)?;
        // A `null` payload is an empty step
        let step: Option<SupplyChainStep> = parse_payload("step", step_data)?;
        let step = step.unwrap_or_default();
        self.validation.check_step(&step)?;

        let now = ctx.timestamp();
        product.append_step(step, now);
        product.touch(now);

        log::debug!(
            "Appended step {} to product {}",
            product.next_ordinal() - 1,
            product_id
        );
        ctx.write_entity(EntityKind::Product, product_id, &product)
    }

    /// The product's steps, oldest first
    pub fn get_product_history(
        &self,
        ctx: &mut TxContext,
        product_id: &str,
    ) -> Result<Vec<SupplyChainStep>, LedgerError> {
        Ok(self.get_product(ctx, product_id)?.supply_chain_steps)
    }

    pub fn product_exists(
        &self,
        ctx: &mut TxContext,
        product_id: &str,
    ) -> Result<bool, LedgerError> {
        ctx.entity_exists(EntityKind::Product, product_id)
    }

    /// Create a farmer profile. Fails if the id is taken.
    pub fn create_farmer(&self, ctx: &mut TxContext, farmer_data: &str) -> Result<(), LedgerError> {
        let mut farmer: Farmer = parse_payload("farmer", farmer_data)?;
        self.validation.check_farmer(&farmer)?;

        if ctx.entity_exists(EntityKind::Farmer, &farmer.id)? {
            return Err(LedgerError::conflict(EntityKind::Farmer, &farmer.id));
        }

        farmer.created_at = ctx.timestamp();

        log::debug!("Creating farmer {}", farmer.id);
        ctx.write_entity(EntityKind::Farmer, &farmer.id, &farmer)
    }

    pub fn get_farmer(&self, ctx: &mut TxContext, farmer_id: &str) -> Result<Farmer, LedgerError> {
        ctx.load_entity(EntityKind::Farmer, farmer_id)
    }

    /// Store a certificate. An existing certificate with the same id is
    /// overwritten without complaint.
    pub fn add_certificate(
        &self,
        ctx: &mut TxContext,
        certificate_data: &str,
    ) -> Result<(), LedgerError> {
        let certificate: Certificate = parse_payload("certificate", certificate_data)?;
        check_id(EntityKind::Certificate, &certificate.id)?;

        log::debug!("Writing certificate {}", certificate.id);
        ctx.write_entity(EntityKind::Certificate, &certificate.id, &certificate)
    }

    pub fn get_certificate(
        &self,
        ctx: &mut TxContext,
        certificate_id: &str,
    ) -> Result<Certificate, LedgerError> {
        ctx.load_entity(EntityKind::Certificate, certificate_id)
    }

    /// Products whose `farmerID` equals `farmer_id`, in store order
    pub fn query_products_by_farmer(
        &self,
        ctx: &mut TxContext,
        farmer_id: &str,
    ) -> Result<Vec<Product>, LedgerError> {
        crate::query::products_by_farmer(ctx, farmer_id)
    }
}

/// Decode a product payload that came back from a query
pub(crate) fn decode_product(key_id: &str, bytes: &[u8]) -> Result<Product, LedgerError> {
    decode_entity(EntityKind::Product, key_id, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{KeyCodec, KeyScheme};
    use crate::storage::{MemoryStore, WorldStateStore};
    use crate::test_utils::{fixed_time, init_logger, product_json, seed};
    use chrono::Duration;
    use serde_json::json;

    /// Runs `op` in its own transaction and commits it on success
    fn run<T>(
        store: &MemoryStore,
        at: chrono::DateTime<chrono::Utc>,
        op: impl FnOnce(&mut TxContext) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        run_with(store, KeyCodec::default(), at, op)
    }

    fn run_with<T>(
        store: &MemoryStore,
        keys: KeyCodec,
        at: chrono::DateTime<chrono::Utc>,
        op: impl FnOnce(&mut TxContext) -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut ctx = TxContext::new(store, keys, "tx", at);
        let out = op(&mut ctx)?;
        store.commit(&ctx.into_commit_batch())?;
        Ok(out)
    }

    #[test]
    fn test_create_and_get_product() {
        init_logger();
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        let payload = product_json("P1", "F1");

        run(&store, fixed_time(), |ctx| contract.create_product(ctx, &payload)).unwrap();
        let product = run(&store, fixed_time(), |ctx| contract.get_product(ctx, "P1")).unwrap();

        let mut expected: Product = serde_json::from_str(&payload).unwrap();
        expected.created_at = fixed_time();
        expected.updated_at = fixed_time();
        assert_eq!(product, expected);
        assert!(product.supply_chain_steps.is_empty());
    }

    #[test]
    fn test_duplicate_product_is_rejected() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        run(&store, fixed_time(), |ctx| {
            contract.create_product(ctx, &product_json("P1", "F1"))
        })
        .unwrap();
        let before = store.get_state("product:P1").unwrap();

        let later = fixed_time() + Duration::hours(1);
        let err = run(&store, later, |ctx| {
            contract.create_product(ctx, &product_json("P1", "F2"))
        })
        .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Conflict { kind: EntityKind::Product, ref id } if id == "P1"
        ));
        assert_eq!(store.get_state("product:P1").unwrap(), before);
    }

    #[test]
    fn test_malformed_payloads() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        for payload in ["", "{", "[1,2]", r#"{"name":"no id"}"#, r#"{"id":7}"#] {
            let err = run(&store, fixed_time(), |ctx| contract.create_product(ctx, payload))
                .unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)), "{:?}", payload);

            let err = run(&store, fixed_time(), |ctx| contract.create_farmer(ctx, payload))
                .unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)), "{:?}", payload);

            let err = run(&store, fixed_time(), |ctx| contract.add_certificate(ctx, payload))
                .unwrap_err();
            assert!(matches!(err, LedgerError::Validation(_)), "{:?}", payload);
        }
        assert_eq!(store.height().unwrap(), 0);
    }

    #[test]
    fn test_corrupt_farmer_and_certificate() {
        let store = MemoryStore::new();
        seed(&store, "farmer:F1", r#"{"id":"F1","verified":"yes"}"#);
        seed(&store, "cert:C1", "{truncated");
        let contract = SupplyChainContract::default();
        let mut ctx = TxContext::new(&store, KeyCodec::default(), "tx", fixed_time());

        match contract.get_farmer(&mut ctx, "F1") {
            Err(LedgerError::Validation(msg)) => assert!(msg.contains("farmer F1")),
            other => panic!("unexpected result: {:?}", other),
        }
        match contract.get_certificate(&mut ctx, "C1") {
            Err(LedgerError::Validation(msg)) => assert!(msg.contains("certificate C1")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_records() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        let mut ctx = TxContext::new(&store, KeyCodec::default(), "tx", fixed_time());

        assert!(matches!(
            contract.get_product(&mut ctx, "P1"),
            Err(LedgerError::NotFound { kind: EntityKind::Product, .. })
        ));
        assert!(matches!(
            contract.get_farmer(&mut ctx, "F1"),
            Err(LedgerError::NotFound { kind: EntityKind::Farmer, .. })
        ));
        assert!(matches!(
            contract.get_certificate(&mut ctx, "C1"),
            Err(LedgerError::NotFound { kind: EntityKind::Certificate, .. })
        ));
        assert!(matches!(
            contract.get_product_history(&mut ctx, "P1"),
            Err(LedgerError::NotFound { .. })
        ));
        assert!(matches!(
            contract.update_product_status(&mut ctx, "P1", "SOLD", "", "x"),
            Err(LedgerError::NotFound { .. })
        ));
        assert!(matches!(
            contract.add_supply_chain_step(&mut ctx, "P1", "{}"),
            Err(LedgerError::NotFound { .. })
        ));
        assert!(!contract.product_exists(&mut ctx, "P1").unwrap());
        assert!(!ctx.has_writes());
    }

    #[test]
    fn test_corrupt_product_is_a_validation_error() {
        let store = MemoryStore::new();
        seed(&store, "product:P1", r#"{"id":"P1","status":42}"#);
        let contract = SupplyChainContract::default();
        let mut ctx = TxContext::new(&store, KeyCodec::default(), "tx", fixed_time());
        assert!(matches!(
            contract.get_product(&mut ctx, "P1"),
            Err(LedgerError::Validation(_))
        ));
    }

    #[test]
    fn test_status_update_appends_step() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        run(&store, fixed_time(), |ctx| {
            contract.create_product(ctx, &product_json("P1", "F1"))
        })
        .unwrap();

        let at = fixed_time() + Duration::days(30);
        let location = r#"{"latitude":10.5,"longitude":76.2,"address":"Mill 4"}"#;
        run(&store, at, |ctx| {
            contract.update_product_status(ctx, "P1", "PROCESSED", location, "MILL-4")
        })
        .unwrap();

        let product = run(&store, at, |ctx| contract.get_product(ctx, "P1")).unwrap();
        assert_eq!(product.status, ProductStatus::Processed);
        assert_eq!(product.current_owner, "MILL-4");
        assert_eq!(product.current_location.address, "Mill 4");
        assert_eq!(product.updated_at, at);
        assert_eq!(product.created_at, fixed_time());

        let step = &product.supply_chain_steps[0];
        assert_eq!(step.id, "P1-0");
        assert_eq!(step.step_type, "PROCESSED");
        assert_eq!(step.actor, "MILL-4");
        assert_eq!(step.location, product.current_location);
        assert_eq!(step.timestamp, at);
        assert_eq!(step.description, "Product status updated to PROCESSED");
    }

    #[test]
    fn test_empty_location_resets_current_location() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        run(&store, fixed_time(), |ctx| {
            contract.create_product(ctx, &product_json("P1", "F1"))
        })
        .unwrap();
        run(&store, fixed_time(), |ctx| {
            contract.update_product_status(
                ctx,
                "P1",
                "IN_TRANSIT",
                r#"{"latitude":1.0,"longitude":2.0,"address":"Truck 9"}"#,
                "CARRIER",
            )
        })
        .unwrap();

        run(&store, fixed_time(), |ctx| {
            contract.update_product_status(ctx, "P1", "SOLD", "", "SHOP")
        })
        .unwrap();

        let product = run(&store, fixed_time(), |ctx| contract.get_product(ctx, "P1")).unwrap();
        assert_eq!(product.status, ProductStatus::Sold);
        assert_eq!(product.current_location, Location::default());
        assert_eq!(product.supply_chain_steps[1].location, Location::default());
    }

    #[test]
    fn test_status_update_rejects_bad_input() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        run(&store, fixed_time(), |ctx| {
            contract.create_product(ctx, &product_json("P1", "F1"))
        })
        .unwrap();
        let height = store.height().unwrap();

        let err = run(&store, fixed_time(), |ctx| {
            contract.update_product_status(ctx, "P1", "EATEN", "", "x")
        })
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let err = run(&store, fixed_time(), |ctx| {
            contract.update_product_status(ctx, "P1", "SOLD", "{broken", "x")
        })
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(store.height().unwrap(), height);
    }

    #[test]
    fn test_add_step_keeps_status_and_assigns_id() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        run(&store, fixed_time(), |ctx| {
            contract.create_product(ctx, &product_json("P1", "F1"))
        })
        .unwrap();

        let at = fixed_time() + Duration::minutes(10);
        let step = json!({
            "id": "caller-chosen",
            "stepType": "INSPECTION",
            "actor": "QA-1",
            "timestamp": "1999-01-01T00:00:00Z",
            "description": "Moisture 12%",
            "metadata": {"moisture": "12"}
        })
        .to_string();
        run(&store, at, |ctx| contract.add_supply_chain_step(ctx, "P1", &step)).unwrap();

        let product = run(&store, at, |ctx| contract.get_product(ctx, "P1")).unwrap();
        assert_eq!(product.status, ProductStatus::Planted);
        assert_eq!(product.current_owner, "F1");
        assert_eq!(product.updated_at, at);

        let step = &product.supply_chain_steps[0];
        assert_eq!(step.id, "P1-0");
        assert_eq!(step.timestamp, at);
        assert_eq!(step.step_type, "INSPECTION");
        assert_eq!(step.metadata.get("moisture").map(String::as_str), Some("12"));
    }

    #[test]
    fn test_updated_at_never_decreases() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        let late = fixed_time() + Duration::days(1);
        run(&store, late, |ctx| {
            contract.create_product(ctx, &product_json("P1", "F1"))
        })
        .unwrap();

        // Clock went backwards between transactions
        run(&store, fixed_time(), |ctx| {
            contract.add_supply_chain_step(ctx, "P1", "{}")
        })
        .unwrap();

        let product = run(&store, late, |ctx| contract.get_product(ctx, "P1")).unwrap();
        assert_eq!(product.updated_at, late);
        assert_eq!(product.supply_chain_steps[0].timestamp, fixed_time());
    }

    #[test]
    fn test_farmers() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        let payload = json!({"id": "F1", "name": "Asha", "verified": true}).to_string();

        run(&store, fixed_time(), |ctx| contract.create_farmer(ctx, &payload)).unwrap();
        let farmer = run(&store, fixed_time(), |ctx| contract.get_farmer(ctx, "F1")).unwrap();
        assert_eq!(farmer.name, "Asha");
        assert!(farmer.verified);
        assert_eq!(farmer.created_at, fixed_time());

        let before = store.get_state("farmer:F1").unwrap();
        let height = store.height().unwrap();

        let renamed = json!({"id": "F1", "name": "Someone Else"}).to_string();
        let later = fixed_time() + Duration::hours(2);
        let err = run(&store, later, |ctx| contract.create_farmer(ctx, &renamed)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Conflict { kind: EntityKind::Farmer, .. }
        ));
        assert_eq!(store.get_state("farmer:F1").unwrap(), before);
        assert_eq!(store.height().unwrap(), height);
    }

    /// A product as earlier deployments stored it: empty status, `null`
    /// collections and offset timestamps
    fn stored_product() -> String {
        let nowhere = json!({"latitude": 0, "longitude": 0, "address": ""});
        json!({
            "id": "P1",
            "name": "Basmati",
            "batchNumber": "B-1",
            "farmerID": "F1",
            "farmLocation": nowhere.clone(),
            "plantingDate": "0001-01-01T00:00:00Z",
            "harvestDate": "0001-01-01T00:00:00Z",
            "quality": "",
            "certifications": null,
            "currentOwner": "",
            "currentLocation": nowhere,
            "status": "",
            "supplyChainSteps": null,
            "ipfsHash": "",
            "qrCode": "",
            "createdAt": "2024-03-01T13:30:00.123456789+05:30",
            "updatedAt": "2024-03-01T13:30:00.123456789+05:30"
        })
        .to_string()
    }

    #[test]
    fn test_reads_records_from_earlier_deployments() {
        init_logger();
        let store = MemoryStore::new();
        let keys = KeyCodec::new(KeyScheme::Flat);
        seed(&store, "P1", &stored_product());
        seed(
            &store,
            "P2",
            r#"{"id":"P2","farmerID":"F1","status":"QUARANTINED","name":null}"#,
        );
        let contract = SupplyChainContract::default();
        let stored_at = fixed_time() + Duration::nanoseconds(123_456_789);

        let product = run_with(&store, keys, fixed_time(), |ctx| contract.get_product(ctx, "P1"))
            .unwrap();
        assert_eq!(product.status, ProductStatus::Planted);
        assert!(product.certifications.is_empty());
        assert!(product.supply_chain_steps.is_empty());
        assert_eq!(product.created_at, stored_at);

        let found = run_with(&store, keys, fixed_time(), |ctx| {
            contract.query_products_by_farmer(ctx, "F1")
        })
        .unwrap();
        let ids: Vec<_> = found.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P1", "P2"]);
        assert_eq!(
            found[1].status,
            ProductStatus::Unrecognized("QUARANTINED".to_string())
        );

        // Both transitions work on the stored records
        let at = fixed_time() + Duration::days(1);
        run_with(&store, keys, at, |ctx| {
            contract.update_product_status(ctx, "P1", "HARVESTED", "null", "F1")
        })
        .unwrap();
        run_with(&store, keys, at, |ctx| contract.add_supply_chain_step(ctx, "P2", "null"))
            .unwrap();

        let p1 = run_with(&store, keys, at, |ctx| contract.get_product(ctx, "P1")).unwrap();
        assert_eq!(p1.status, ProductStatus::Harvested);
        assert_eq!(p1.supply_chain_steps[0].id, "P1-0");
        assert_eq!(p1.created_at, stored_at);

        let p2 = run_with(&store, keys, at, |ctx| contract.get_product(ctx, "P2")).unwrap();
        assert_eq!(p2.supply_chain_steps[0].id, "P2-0");
        assert_eq!(p2.status.as_str(), "QUARANTINED");
    }

    #[test]
    fn test_empty_status_on_create() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        run(&store, fixed_time(), |ctx| {
            contract.create_product(ctx, r#"{"id":"P1","farmerID":"F1","status":""}"#)
        })
        .unwrap();
        let product = run(&store, fixed_time(), |ctx| contract.get_product(ctx, "P1")).unwrap();
        assert_eq!(product.status, ProductStatus::Planted);

        // New statuses must still be one of the named ones when updating
        let err = run(&store, fixed_time(), |ctx| {
            contract.update_product_status(ctx, "P1", "QUARANTINED", "", "x")
        })
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn test_certificates_overwrite() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        let first = json!({"id": "C1", "productID": "P1", "type": "ORGANIC", "status": "PENDING"})
            .to_string();
        let second = json!({"id": "C1", "productID": "P1", "type": "ORGANIC", "status": "VALID"})
            .to_string();

        run(&store, fixed_time(), |ctx| contract.add_certificate(ctx, &first)).unwrap();
        run(&store, fixed_time(), |ctx| contract.add_certificate(ctx, &second)).unwrap();

        let cert = run(&store, fixed_time(), |ctx| contract.get_certificate(ctx, "C1")).unwrap();
        assert_eq!(cert.status, "VALID");
    }

    #[test]
    fn test_kinds_do_not_collide_with_prefixed_keys() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::default();
        run(&store, fixed_time(), |ctx| {
            contract.create_product(ctx, &product_json("X1", "F1"))
        })
        .unwrap();
        run(&store, fixed_time(), |ctx| {
            contract.create_farmer(ctx, r#"{"id":"X1"}"#)
        })
        .unwrap();
        run(&store, fixed_time(), |ctx| {
            contract.add_certificate(ctx, r#"{"id":"X1"}"#)
        })
        .unwrap();

        let product = run(&store, fixed_time(), |ctx| contract.get_product(ctx, "X1")).unwrap();
        assert_eq!(product.farmer_id, "F1");
    }

    #[test]
    fn test_strict_policy_applies_to_payloads() {
        let store = MemoryStore::new();
        let contract = SupplyChainContract::new(ValidationPolicy::Strict);
        let err = run(&store, fixed_time(), |ctx| {
            contract.create_farmer(ctx, r#"{"id":"F1","name":"Asha","email":"nope"}"#)
        })
        .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        let mut payload: serde_json::Value =
            serde_json::from_str(&product_json("P1", "F1")).unwrap();
        payload["status"] = json!("ROTTEN");
        let payload = payload.to_string();
        let err = run(&store, fixed_time(), |ctx| contract.create_product(ctx, &payload))
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));

        // The lenient policy keeps whatever status string it was given
        let lenient = SupplyChainContract::default();
        run(&store, fixed_time(), |ctx| lenient.create_product(ctx, &payload)).unwrap();
        let product = run(&store, fixed_time(), |ctx| lenient.get_product(ctx, "P1")).unwrap();
        assert_eq!(product.status.as_str(), "ROTTEN");
    }
}
