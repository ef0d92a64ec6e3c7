use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ProductionType;

/// A production batch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Production {
    pub id: String,
    pub date: DateTime<Utc>,
    pub production_type: ProductionType,
}

crate::impl_auditable!(Production, Production, id);
