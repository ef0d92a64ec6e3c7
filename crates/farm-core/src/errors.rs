//! Cross-cutting error types.
//!
//! Persistence errors (`DatabaseError`) live in `farm-db`; this module only
//! covers failures that can be detected without touching storage.

use thiserror::Error;

/// Errors that can be raised by any farm crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// Data failed validation against a fixed choice set.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
