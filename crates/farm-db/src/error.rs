//! Database error types for farm-db.

use farm_core::errors::CoreError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Input failed validation (e.g. an unknown action kind). Nothing was written.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced actor or target row does not exist. Nothing was written.
    #[error("Reference error: {0}")]
    Reference(String),

    /// Audit records and links got out of step; the transaction was rolled back.
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// A SQL query failed or returned malformed data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// Invalid state encountered (e.g., bad data in DB).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<CoreError> for DatabaseError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::NotFound { entity_type, id } => {
                Self::Reference(format!("{entity_type} {id} does not exist"))
            }
            CoreError::Other(e) => Self::Other(e),
        }
    }
}
