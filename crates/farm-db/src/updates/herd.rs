//! Herd update builder.

use chrono::{DateTime, Utc};
use farm_core::enums::{AnimalType, Sex, StockType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HerdUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ear_tag: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animal_type: Option<AnimalType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rebouclage_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chevre_quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiptag_quantity: Option<i64>,
}

#[derive(Default)]
pub struct HerdUpdateBuilder(HerdUpdate);

impl HerdUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn birth_date(mut self, val: DateTime<Utc>) -> Self {
        self.0.birth_date = Some(val);
        self
    }

    #[must_use]
    pub fn ear_tag(mut self, val: i64) -> Self {
        self.0.ear_tag = Some(val);
        self
    }

    #[must_use]
    pub fn sex(mut self, val: Sex) -> Self {
        self.0.sex = Some(val);
        self
    }

    #[must_use]
    pub fn animal_type(mut self, val: AnimalType) -> Self {
        self.0.animal_type = Some(val);
        self
    }

    /// Set the quantity column backing one stock category.
    #[must_use]
    pub fn stock(mut self, stock: StockType, quantity: i64) -> Self {
        match stock {
            StockType::Rebouclage => self.0.rebouclage_quantity = Some(quantity),
            StockType::Chevre => self.0.chevre_quantity = Some(quantity),
            StockType::Tiptag => self.0.tiptag_quantity = Some(quantity),
        }
        self
    }

    #[must_use]
    pub fn build(self) -> HerdUpdate {
        self.0
    }
}
