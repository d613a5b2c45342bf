use crate::error::LedgerError;
use crate::keys::EntityKind;
use crate::model::{Farmer, Product, SupplyChainStep};
use serde::{Deserialize, Serialize};

/// How much checking is applied to incoming payloads beyond parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Payloads only need to parse and carry a usable id
    #[default]
    Lenient,
    /// Additionally enforce the field rules of the public API
    Strict,
}

const NAME_LEN: std::ops::RangeInclusive<usize> = 2..=100;

/// Ids become world-state keys and must be usable as such
pub fn check_id(kind: EntityKind, id: &str) -> Result<(), LedgerError> {
    if id.is_empty() {
        return Err(LedgerError::validation(format!("{} id must not be empty", kind)));
    }
    if id.contains('\0') {
        return Err(LedgerError::validation(format!(
            "{} id {:?} must not contain NUL",
            kind, id
        )));
    }
    Ok(())
}

fn require(kind: EntityKind, field: &str, value: &str) -> Result<(), LedgerError> {
    if value.trim().is_empty() {
        return Err(LedgerError::validation(format!("{} {} is required", kind, field)));
    }
    Ok(())
}

fn check_name(kind: EntityKind, name: &str) -> Result<(), LedgerError> {
    if !NAME_LEN.contains(&name.chars().count()) {
        return Err(LedgerError::validation(format!(
            "{} name must be between {} and {} characters",
            kind,
            NAME_LEN.start(),
            NAME_LEN.end()
        )));
    }
    Ok(())
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map(|(host, tld)| !host.is_empty() && !tld.is_empty())
                    .unwrap_or(false)
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

impl ValidationPolicy {
    pub fn check_product(&self, product: &Product) -> Result<(), LedgerError> {
        check_id(EntityKind::Product, &product.id)?;
        if *self == ValidationPolicy::Strict {
            check_name(EntityKind::Product, &product.name)?;
            require(EntityKind::Product, "batchNumber", &product.batch_number)?;
            require(EntityKind::Product, "farmerID", &product.farmer_id)?;
            if !product.status.is_recognized() {
                return Err(LedgerError::validation(format!(
                    "unknown product status {:?}",
                    product.status.as_str()
                )));
            }
        }
        Ok(())
    }

    pub fn check_farmer(&self, farmer: &Farmer) -> Result<(), LedgerError> {
        check_id(EntityKind::Farmer, &farmer.id)?;
        if *self == ValidationPolicy::Strict {
            check_name(EntityKind::Farmer, &farmer.name)?;
            if !looks_like_email(&farmer.email) {
                return Err(LedgerError::validation(format!(
                    "farmer email {:?} is not a valid address",
                    farmer.email
                )));
            }
            require(EntityKind::Farmer, "phone", &farmer.phone)?;
        }
        Ok(())
    }

    pub fn check_step(&self, step: &SupplyChainStep) -> Result<(), LedgerError> {
        if *self == ValidationPolicy::Strict {
            require(EntityKind::Product, "step stepType", &step.step_type)?;
            require(EntityKind::Product, "step actor", &step.actor)?;
            require(EntityKind::Product, "step description", &step.description)?;
        }
        Ok(())
    }
}
