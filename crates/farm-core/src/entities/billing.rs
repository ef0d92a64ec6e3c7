use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::FinancingType;

/// A bill received from a supplier.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SupplierBilling {
    pub id: String,
    pub name: String,
    /// Set once when the row is created.
    pub date: DateTime<Utc>,
    pub date_supplier: DateTime<Utc>,
    /// Price in cents (two decimal places).
    pub price_cents: i64,
    pub payment: FinancingType,
    pub comment: String,
}

/// A bill issued to a customer.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CustomerBilling {
    pub id: String,
    pub name: String,
    pub date: DateTime<Utc>,
    pub date_billing: DateTime<Utc>,
    /// Price in cents (two decimal places).
    pub price_cents: i64,
    pub payment: FinancingType,
    pub comment: String,
}

crate::impl_auditable!(SupplierBilling, SupplierBilling, id);
crate::impl_auditable!(CustomerBilling, CustomerBilling, id);
