//! The `Auditable` capability shared by every audited entity.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::registry::EntityType;

/// An entity whose mutations are recorded in an audit trail.
///
/// The recorder only ever sees this capability: the registered type tag and
/// the row's primary key. It never needs the concrete entity type.
pub trait Auditable {
    /// Registered type tag for this entity.
    const ENTITY_TYPE: EntityType;

    /// Primary key of this row in [`EntityType::table`].
    fn audit_id(&self) -> &str;

    /// Weak `(type tag, id)` reference to this row.
    fn audit_target(&self) -> AuditTarget {
        AuditTarget::new(Self::ENTITY_TYPE, self.audit_id())
    }
}

/// A weakly typed reference to an auditable row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct AuditTarget {
    pub entity_type: EntityType,
    pub id: String,
}

impl AuditTarget {
    #[must_use]
    pub fn new(entity_type: EntityType, id: impl Into<String>) -> Self {
        Self {
            entity_type,
            id: id.into(),
        }
    }
}

impl fmt::Display for AuditTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.entity_type, self.id)
    }
}

/// Implements [`Auditable`] for an entity struct keyed by the given field.
#[macro_export]
macro_rules! impl_auditable {
    ($ty:ty, $entity:ident, $field:ident) => {
        impl $crate::auditable::Auditable for $ty {
            const ENTITY_TYPE: $crate::registry::EntityType = $crate::registry::EntityType::$entity;

            fn audit_id(&self) -> &str {
                &self.$field
            }
        }
    };
}
