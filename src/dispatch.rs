//! String-argument entry points, the surface remote callers invoke.
//!
//! Structured inputs arrive as JSON text and results leave as JSON text.
//! Functions that only write return an empty payload.

use crate::context::TxContext;
use crate::contract::SupplyChainContract;
use crate::error::LedgerError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Named functions exposed by the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractFunction {
    InitLedger,
    CreateProduct,
    GetProduct,
    UpdateProductStatus,
    AddSupplyChainStep,
    GetProductHistory,
    ProductExists,
    CreateFarmer,
    GetFarmer,
    AddCertificate,
    GetCertificate,
    QueryProductsByFarmer,
}

impl ContractFunction {
    pub const ALL: [ContractFunction; 12] = [
        ContractFunction::InitLedger,
        ContractFunction::CreateProduct,
        ContractFunction::GetProduct,
        ContractFunction::UpdateProductStatus,
        ContractFunction::AddSupplyChainStep,
        ContractFunction::GetProductHistory,
        ContractFunction::ProductExists,
        ContractFunction::CreateFarmer,
        ContractFunction::GetFarmer,
        ContractFunction::AddCertificate,
        ContractFunction::GetCertificate,
        ContractFunction::QueryProductsByFarmer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ContractFunction::InitLedger => "InitLedger",
            ContractFunction::CreateProduct => "CreateProduct",
            ContractFunction::GetProduct => "GetProduct",
            ContractFunction::UpdateProductStatus => "UpdateProductStatus",
            ContractFunction::AddSupplyChainStep => "AddSupplyChainStep",
            ContractFunction::GetProductHistory => "GetProductHistory",
            ContractFunction::ProductExists => "ProductExists",
            ContractFunction::CreateFarmer => "CreateFarmer",
            ContractFunction::GetFarmer => "GetFarmer",
            ContractFunction::AddCertificate => "AddCertificate",
            ContractFunction::GetCertificate => "GetCertificate",
            ContractFunction::QueryProductsByFarmer => "QueryProductsByFarmer",
        }
    }

    /// Number of string arguments the function takes
    pub fn arity(&self) -> usize {
        match self {
            ContractFunction::InitLedger => 0,
            ContractFunction::UpdateProductStatus => 4,
            ContractFunction::AddSupplyChainStep => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for ContractFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ContractFunction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContractFunction::ALL
            .iter()
            .copied()
            .find(|function| function.name() == s)
            .ok_or_else(|| LedgerError::validation(format!("unknown function {:?}", s)))
    }
}

fn to_payload<T: Serialize>(value: &T) -> Result<String, LedgerError> {
    serde_json::to_string(value)
        .map_err(|e| LedgerError::validation(format!("failed to marshal result: {}", e)))
}

/// Run one named function against a transaction context
pub fn invoke<S: AsRef<str>>(
    contract: &SupplyChainContract,
    ctx: &mut TxContext,
    function: ContractFunction,
    args: &[S],
) -> Result<String, LedgerError> {
    if args.len() != function.arity() {
        return Err(LedgerError::validation(format!(
            "{} expects {} argument(s), got {}",
            function,
            function.arity(),
            args.len()
        )));
    }
    let arg = |i: usize| args[i].as_ref();

    match function {
        ContractFunction::InitLedger => contract.init_ledger(ctx).map(|_| String::new()),
        ContractFunction::CreateProduct => {
            contract.create_product(ctx, arg(0)).map(|_| String::new())
        }
        ContractFunction::GetProduct => to_payload(&contract.get_product(ctx, arg(0))?),
        ContractFunction::UpdateProductStatus => contract
            .update_product_status(ctx, arg(0), arg(1), arg(2), arg(3))
            .map(|_| String::new()),
        ContractFunction::AddSupplyChainStep => contract
            .add_supply_chain_step(ctx, arg(0), arg(1))
            .map(|_| String::new()),
        ContractFunction::GetProductHistory => {
            to_payload(&contract.get_product_history(ctx, arg(0))?)
        }
        ContractFunction::ProductExists => to_payload(&contract.product_exists(ctx, arg(0))?),
        ContractFunction::CreateFarmer => {
            contract.create_farmer(ctx, arg(0)).map(|_| String::new())
        }
        ContractFunction::GetFarmer => to_payload(&contract.get_farmer(ctx, arg(0))?),
        ContractFunction::AddCertificate => {
            contract.add_certificate(ctx, arg(0)).map(|_| String::new())
        }
        ContractFunction::GetCertificate => to_payload(&contract.get_certificate(ctx, arg(0))?),
        ContractFunction::QueryProductsByFarmer => {
            to_payload(&contract.query_products_by_farmer(ctx, arg(0))?)
        }
    }
}
