//! Production update builder.

use chrono::{DateTime, Utc};
use farm_core::enums::ProductionType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_type: Option<ProductionType>,
}

#[derive(Default)]
pub struct ProductionUpdateBuilder(ProductionUpdate);

impl ProductionUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn date(mut self, val: DateTime<Utc>) -> Self {
        self.0.date = Some(val);
        self
    }

    #[must_use]
    pub fn production_type(mut self, val: ProductionType) -> Self {
        self.0.production_type = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> ProductionUpdate {
        self.0
    }
}
