use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ActorRole;

/// A user who performs mutations. Owned by account management.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub username: String,
    pub role: ActorRole,
    pub created_at: DateTime<Utc>,
}
