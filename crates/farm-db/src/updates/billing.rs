//! Supplier and customer billing update builders.

use chrono::{DateTime, Utc};
use farm_core::enums::FinancingType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierBillingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_supplier: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<FinancingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Default)]
pub struct SupplierBillingUpdateBuilder(SupplierBillingUpdate);

impl SupplierBillingUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.0.name = Some(val.into());
        self
    }

    #[must_use]
    pub fn date_supplier(mut self, val: DateTime<Utc>) -> Self {
        self.0.date_supplier = Some(val);
        self
    }

    #[must_use]
    pub fn price_cents(mut self, val: i64) -> Self {
        self.0.price_cents = Some(val);
        self
    }

    #[must_use]
    pub fn payment(mut self, val: FinancingType) -> Self {
        self.0.payment = Some(val);
        self
    }

    #[must_use]
    pub fn comment(mut self, val: impl Into<String>) -> Self {
        self.0.comment = Some(val.into());
        self
    }

    #[must_use]
    pub fn build(self) -> SupplierBillingUpdate {
        self.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerBillingUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_billing: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<FinancingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Default)]
pub struct CustomerBillingUpdateBuilder(CustomerBillingUpdate);

impl CustomerBillingUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.0.name = Some(val.into());
        self
    }

    #[must_use]
    pub fn date_billing(mut self, val: DateTime<Utc>) -> Self {
        self.0.date_billing = Some(val);
        self
    }

    #[must_use]
    pub fn price_cents(mut self, val: i64) -> Self {
        self.0.price_cents = Some(val);
        self
    }

    #[must_use]
    pub fn payment(mut self, val: FinancingType) -> Self {
        self.0.payment = Some(val);
        self
    }

    #[must_use]
    pub fn comment(mut self, val: impl Into<String>) -> Self {
        self.0.comment = Some(val.into());
        self
    }

    #[must_use]
    pub fn build(self) -> CustomerBillingUpdate {
        self.0
    }
}
