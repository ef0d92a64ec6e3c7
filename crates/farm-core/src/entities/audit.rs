use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::auditable::AuditTarget;
use crate::enums::{ActionKind, AuditDomain};
use crate::registry::EntityType;

/// One immutable mutation event in an audit trail.
///
/// The target is referenced weakly through `(entity_type, object_id)`; the
/// strongly typed reference lives in the matching [`AuditLink`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditRecord {
    pub id: String,
    pub domain: AuditDomain,
    pub action: ActionKind,
    pub action_date: DateTime<Utc>,
    pub actor_id: String,
    pub entity_type: EntityType,
    pub object_id: String,
}

impl AuditRecord {
    #[must_use]
    pub fn target(&self) -> AuditTarget {
        AuditTarget::new(self.entity_type, self.object_id.clone())
    }
}

impl fmt::Display for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} - {}", self.action, self.entity_type, self.object_id)
    }
}

/// A row of one entity type's link table, binding an audit record to a row.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditLink {
    pub id: i64,
    pub action_id: String,
    pub entity_type: EntityType,
    pub target_id: String,
}
