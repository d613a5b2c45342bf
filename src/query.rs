//! Secondary-index queries over entity records.

use crate::context::TxContext;
use crate::contract::decode_product;
use crate::error::LedgerError;
use crate::keys::EntityKind;
use crate::model::Product;
use crate::selector::Selector;

/// JSON field a product stores its farmer under
const FARMER_FIELD: &str = "farmerID";

/// Selector matching product records that belong to `farmer_id`
pub fn farmer_selector(ctx: &TxContext, farmer_id: &str) -> Selector {
    let selector = Selector::new().field_equals(FARMER_FIELD, farmer_id);
    match ctx.keys().kind_prefix(EntityKind::Product) {
        Some(prefix) => selector.with_key_prefix(prefix),
        None => selector,
    }
}

/// Every product whose `farmerID` equals `farmer_id`, in the order the
/// store returns them. No match is an empty list.
pub fn products_by_farmer(ctx: &TxContext, farmer_id: &str) -> Result<Vec<Product>, LedgerError> {
    let selector = farmer_selector(ctx, farmer_id);
    log::debug!("Running selector query {}", selector.to_query_string());

    let results = ctx
        .get_query_result(&selector)
        .map_err(LedgerError::into_query_error)?;

    let mut products = Vec::new();
    for result in results {
        let entry = result.map_err(|e| match e.into_query_error() {
            LedgerError::Query(msg) => {
                LedgerError::Query(format!("failed to get next result: {}", msg))
            }
            other => other,
        })?;
        let id = ctx
            .keys()
            .entity_id(EntityKind::Product, &entry.key)
            .unwrap_or(&entry.key);
        products.push(decode_product(id, &entry.value)?);
    }
    Ok(products)
}
