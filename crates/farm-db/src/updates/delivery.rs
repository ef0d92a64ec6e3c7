//! Delivery update builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_delivery: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub liter: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Default)]
pub struct DeliveryUpdateBuilder(DeliveryUpdate);

impl DeliveryUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn date_delivery(mut self, val: DateTime<Utc>) -> Self {
        self.0.date_delivery = Some(val);
        self
    }

    #[must_use]
    pub fn liter(mut self, val: i64) -> Self {
        self.0.liter = Some(val);
        self
    }

    #[must_use]
    pub fn comment(mut self, val: impl Into<String>) -> Self {
        self.0.comment = Some(val.into());
        self
    }

    #[must_use]
    pub fn build(self) -> DeliveryUpdate {
        self.0
    }
}
