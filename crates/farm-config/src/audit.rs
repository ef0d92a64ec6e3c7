//! Audit trail query defaults.

use serde::{Deserialize, Serialize};

/// Default number of records returned by an audit query.
const fn default_limit() -> u32 {
    100
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Row cap applied to filtered audit queries without an explicit limit.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}
