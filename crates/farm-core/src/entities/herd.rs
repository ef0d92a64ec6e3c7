use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AnimalType, Sex, StockType};

/// One animal of the herd, with its ear tag stock counters.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Herd {
    pub id: String,
    pub birth_date: DateTime<Utc>,
    pub ear_tag: i64,
    pub sex: Sex,
    pub animal_type: AnimalType,
    pub rebouclage_quantity: i64,
    pub chevre_quantity: i64,
    pub tiptag_quantity: i64,
}

impl Herd {
    /// Quantity held for one ear tag stock category.
    #[must_use]
    pub const fn stock_quantity(&self, stock: StockType) -> i64 {
        match stock {
            StockType::Rebouclage => self.rebouclage_quantity,
            StockType::Chevre => self.chevre_quantity,
            StockType::Tiptag => self.tiptag_quantity,
        }
    }
}

impl fmt::Display for Herd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {}",
            self.id,
            self.sex.label(),
            self.animal_type.label()
        )
    }
}

crate::impl_auditable!(Herd, Herd, id);
