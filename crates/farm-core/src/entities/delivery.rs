use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A milk delivery.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Delivery {
    pub id: String,
    pub date: DateTime<Utc>,
    pub date_delivery: DateTime<Utc>,
    pub liter: i64,
    pub comment: String,
}

crate::impl_auditable!(Delivery, Delivery, id);
