//! # farm-db
//!
//! libSQL persistence for the farm ("gestion") and recipe domains.
//!
//! Handles all relational state: actors, billing, deliveries, production
//! batches, herd animals, recipes with their ingredients, steps and product
//! specializations, and the two audit trails recording every mutation.
//!
//! Every mutation runs inside an [`audit::AuditedTx`]: the entity write, the
//! audit record, and the strongly typed audit link commit together or not at
//! all.

pub mod audit;
pub mod error;
pub mod helpers;
mod migrations;
pub mod repos;
pub mod service;
pub mod updates;

#[cfg(test)]
mod test_support;

use std::ops::Deref;
use std::sync::Arc;

use error::DatabaseError;
use farm_config::DatabaseConfig;
use libsql::Builder;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Central database handle.
///
/// Wraps a libSQL database and its connection, and provides ID generation.
/// The connection is shared by every task using this handle, so access goes
/// through [`FarmDb::conn`], which waits on a single gate. An
/// [`audit::AuditedTx`] holds that gate until it ends, so no other task on
/// the same handle can interleave statements with an open transaction or
/// read its uncommitted rows.
pub struct FarmDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
    gate: Arc<Mutex<()>>,
}

/// Exclusive use of the shared connection; releases the gate on drop.
pub struct DbConn {
    conn: libsql::Connection,
    _gate: OwnedMutexGuard<()>,
}

impl Deref for DbConn {
    type Target = libsql::Connection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl FarmDb {
    /// Open a local database at the given path (`":memory:"` for tests) with
    /// the default busy timeout.
    ///
    /// Runs migrations automatically on open.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        Self::open(&DatabaseConfig {
            path: path.to_string(),
            ..DatabaseConfig::default()
        })
        .await
    }

    /// Open the database described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the database cannot be opened or
    /// migrations fail.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let path = config.path.as_str();
        let db = Builder::new_local(path).build().await?;
        let conn = db.connect()?;

        // Foreign keys are per-connection in SQLite; every cascade depends on them.
        conn.execute("PRAGMA foreign_keys = ON", ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA foreign_keys: {e}")))?;
        // Writers on other connections to the same file wait for the lock.
        let mut rows = conn
            .query(&format!("PRAGMA busy_timeout = {}", config.busy_timeout_ms), ())
            .await
            .map_err(|e| DatabaseError::Migration(format!("PRAGMA busy_timeout: {e}")))?;
        while rows.next().await?.is_some() {}

        let farm_db = Self {
            db,
            conn,
            gate: Arc::new(Mutex::new(())),
        };
        farm_db.run_migrations().await?;
        tracing::info!(path, busy_timeout_ms = config.busy_timeout_ms, "database opened");
        Ok(farm_db)
    }

    /// Wait for the connection gate and return the shared connection.
    ///
    /// Waits forever if the calling task already holds the gate, for example
    /// through an open [`audit::AuditedTx`]; use [`audit::AuditedTx::conn`]
    /// there instead.
    pub async fn conn(&self) -> DbConn {
        DbConn {
            conn: self.conn.clone(),
            _gate: Arc::clone(&self.gate).lock_owned().await,
        }
    }

    pub(crate) fn gate(&self) -> Arc<Mutex<()>> {
        Arc::clone(&self.gate)
    }

    /// Generate a prefixed ID via libSQL. Returns e.g. `"dlv-a3f8b2c1"`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str) -> Result<String, DatabaseError> {
        generate_id(&*self.conn().await, prefix).await
    }
}

/// Generate a prefixed ID on any connection, including an open transaction.
///
/// Uses `randomblob(4)` in SQL to produce 8-char hex, then prepends the prefix.
pub(crate) async fn generate_id(
    conn: &libsql::Connection,
    prefix: &str,
) -> Result<String, DatabaseError> {
    let mut rows = conn
        .query("SELECT lower(hex(randomblob(4)))", ())
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    Ok(farm_core::ids::format_id(prefix, &row.get::<String>(0)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn test_db() -> FarmDb {
        FarmDb::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;

        let mut tables = vec![
            "users",
            "supplier_billings",
            "customer_billings",
            "deliveries",
            "productions",
            "herd",
            "recipes",
            "ingredients",
            "steps",
            "cheeses",
            "wools",
            "soaps",
            "basketries",
            "goat_skins",
            "others",
            "gestion_model_actions",
            "recipes_model_actions",
        ];
        tables.extend(
            farm_core::registry::EntityType::ALL
                .iter()
                .map(|t| t.link_table()),
        );

        for table in &tables {
            let mut rows = db
                .conn()
                .await
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [*table],
                )
                .await
                .unwrap();
            let row = rows.next().await.unwrap();
            assert!(row.is_some(), "table '{table}' should exist");
        }
    }

    #[tokio::test]
    async fn foreign_keys_enabled() {
        let db = test_db().await;
        let conn = db.conn().await;
        let mut rows = conn.query("PRAGMA foreign_keys", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<i64>(0).unwrap(), 1);
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db.generate_id("dlv").await.unwrap();
        assert!(id.starts_with("dlv-"), "ID should start with 'dlv-': {id}");
        assert_eq!(id.len(), 12, "ID should be 12 chars: {id}");
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn generate_id_uniqueness() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let id = db.generate_id("tst").await.unwrap();
            assert!(ids.insert(id.clone()), "Duplicate ID generated: {id}");
        }
    }

    #[tokio::test]
    async fn idempotent_migrations() {
        let db = test_db().await;
        db.run_migrations().await.unwrap();
    }

    #[tokio::test]
    async fn action_table_rejects_unknown_kind() {
        let db = test_db().await;
        db.conn()
            .await
            .execute(
                "INSERT INTO users (id, username, role, created_at) VALUES ('usr-1', 'ana', 'ADMIN', '2026-02-09T14:30:00.000000Z')",
                (),
            )
            .await
            .unwrap();

        let result = db
            .conn()
            .await
            .execute(
                "INSERT INTO gestion_model_actions (id, action, action_date, user_id, entity_type, object_id)
                 VALUES ('gac-1', 'INVALID', '2026-02-09T14:30:00.000000Z', 'usr-1', 'delivery', 'dlv-1')",
                (),
            )
            .await;
        assert!(result.is_err(), "CHECK constraint should reject INVALID");
    }

    #[tokio::test]
    async fn action_table_rejects_foreign_domain_type() {
        let db = test_db().await;
        db.conn()
            .await
            .execute(
                "INSERT INTO users (id, username, role, created_at) VALUES ('usr-1', 'ana', 'ADMIN', '2026-02-09T14:30:00.000000Z')",
                (),
            )
            .await
            .unwrap();

        let result = db
            .conn()
            .await
            .execute(
                "INSERT INTO gestion_model_actions (id, action, action_date, user_id, entity_type, object_id)
                 VALUES ('gac-1', 'CREATE', '2026-02-09T14:30:00.000000Z', 'usr-1', 'cheese', 'ing-1')",
                (),
            )
            .await;
        assert!(result.is_err(), "recipe types belong to the recipes trail");
    }

    #[tokio::test]
    async fn file_backed_database_persists_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("farm.db");
        let path = path.to_str().unwrap();

        {
            let db = FarmDb::open_local(path).await.unwrap();
            db.conn()
                .await
                .execute(
                    "INSERT INTO recipes (id, name) VALUES ('rcp-1', 'Tomme')",
                    (),
                )
                .await
                .unwrap();
        }

        let db = FarmDb::open_local(path).await.unwrap();
        let conn = db.conn().await;
        let mut rows = conn
            .query("SELECT name FROM recipes WHERE id = 'rcp-1'", ())
            .await
            .unwrap();
        let row = rows.next().await.unwrap().unwrap();
        assert_eq!(row.get::<String>(0).unwrap(), "Tomme");
    }
}
