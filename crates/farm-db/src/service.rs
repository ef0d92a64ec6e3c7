//! Service layer pairing every mutation with its audit record.
//!
//! `FarmService` wraps `FarmDb` (raw database access) and the audit settings.
//! All repo methods are implemented as `impl FarmService`.

use farm_config::{AuditConfig, FarmConfig};
use farm_core::auditable::Auditable;
use farm_core::entities::AuditRecord;
use farm_core::enums::ActionKind;

use crate::FarmDb;
use crate::audit::AuditedTx;
use crate::error::DatabaseError;

/// Orchestrates database mutations with their audit trail.
///
/// Every mutation method follows this protocol:
/// 1. Take the connection gate and begin an immediate transaction
/// 2. Execute SQL
/// 3. Record the audit entry and its link (inside the transaction)
/// 4. Commit, or roll back everything on any failure
pub struct FarmService {
    db: FarmDb,
    audit: AuditConfig,
}

impl FarmService {
    /// Create a new service wrapping a local database.
    ///
    /// # Arguments
    ///
    /// * `db_path` - Path to the libSQL database file, or `":memory:"` for tests.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened.
    pub async fn new_local(db_path: &str) -> Result<Self, DatabaseError> {
        let db = FarmDb::open_local(db_path).await?;
        Ok(Self::from_db(db))
    }

    /// Create a service from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the configured database cannot be opened.
    pub async fn from_config(config: &FarmConfig) -> Result<Self, DatabaseError> {
        let db = FarmDb::open(&config.database).await?;
        Ok(Self {
            db,
            audit: config.audit.clone(),
        })
    }

    /// Create from an existing `FarmDb` with default audit settings.
    #[must_use]
    pub fn from_db(db: FarmDb) -> Self {
        Self {
            db,
            audit: AuditConfig::default(),
        }
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &FarmDb {
        &self.db
    }

    /// Row limit applied by audit queries that do not set their own.
    #[must_use]
    pub const fn default_limit(&self) -> u32 {
        self.audit.default_limit
    }

    /// Open an audited unit of work.
    ///
    /// Waits while another task on this service has one open. Across
    /// connections, SQLite's write lock is awaited for up to the configured
    /// busy timeout.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the write lock cannot be taken.
    pub async fn begin_audited(&self) -> Result<AuditedTx, DatabaseError> {
        AuditedTx::begin(&self.db).await
    }

    /// Record and link one mutation in its own transaction.
    ///
    /// For callers whose entity write already happened outside this service.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor or target does not
    /// exist, or `DatabaseError` if the writes fail.
    pub async fn record_mutation<T: Auditable>(
        &self,
        action: ActionKind,
        actor_id: &str,
        target: &T,
    ) -> Result<AuditRecord, DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = tx.record_and_link(action, actor_id, target).await;
        tx.finish(result).await
    }
}
