//! Database migration runner.
//!
//! Entity tables come from SQL files embedded at compile time. Audit tables
//! (one action table per domain, one link table per entity type) are generated
//! from the `EntityType` registry, so the link tables cannot drift from the
//! entity list. All statements use `IF NOT EXISTS` for idempotent re-running.

use farm_core::enums::{ActionKind, AuditDomain};
use farm_core::registry::EntityType;

use crate::FarmDb;
use crate::error::DatabaseError;

const MIGRATION_001: &str = include_str!("../migrations/001_users.sql");
const MIGRATION_002: &str = include_str!("../migrations/002_gestion.sql");
const MIGRATION_003: &str = include_str!("../migrations/003_recipes.sql");

/// Quote a list of stored codes for an SQL `IN (...)` check.
fn sql_list<'a>(codes: impl Iterator<Item = &'a str>) -> String {
    codes
        .map(|c| format!("'{c}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// DDL for one domain's action table.
fn actions_table_ddl(domain: AuditDomain) -> String {
    let table = domain.actions_table();
    let actions = sql_list(ActionKind::ALL.iter().map(|a| a.as_str()));
    let entity_types = sql_list(EntityType::in_domain(domain).map(EntityType::as_str));
    format!(
        "CREATE TABLE IF NOT EXISTS {table} (
            id TEXT PRIMARY KEY,
            action TEXT NOT NULL CHECK (action IN ({actions})),
            action_date TEXT NOT NULL,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            entity_type TEXT NOT NULL CHECK (entity_type IN ({entity_types})),
            object_id TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_{table}_target ON {table}(entity_type, object_id, action_date);
        CREATE INDEX IF NOT EXISTS idx_{table}_user ON {table}(user_id, action_date);
        CREATE INDEX IF NOT EXISTS idx_{table}_date ON {table}(action_date);
        CREATE TRIGGER IF NOT EXISTS {table}_no_update BEFORE UPDATE ON {table} BEGIN
            SELECT RAISE(ABORT, 'audit records are immutable');
        END;\n"
    )
}

/// DDL for one entity type's link table.
///
/// Each row references exactly one audit record of the owning domain and one
/// target row; deleting either side deletes the link.
fn link_table_ddl(entity: EntityType) -> String {
    let link_table = entity.link_table();
    let link_column = entity.link_column();
    let actions_table = entity.domain().actions_table();
    let table = entity.table();
    let id_column = entity.id_column();
    format!(
        "CREATE TABLE IF NOT EXISTS {link_table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            action_id TEXT NOT NULL UNIQUE REFERENCES {actions_table}(id) ON DELETE CASCADE,
            {link_column} TEXT NOT NULL REFERENCES {table}({id_column}) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_{link_table}_target ON {link_table}({link_column});\n"
    )
}

/// Full audit schema for both domains.
pub(crate) fn audit_schema() -> String {
    let mut ddl = String::new();
    for domain in AuditDomain::ALL {
        ddl.push_str(&actions_table_ddl(*domain));
    }
    for entity in EntityType::ALL {
        ddl.push_str(&link_table_ddl(*entity));
    }
    ddl
}

impl FarmDb {
    /// Run all migrations in sequence.
    pub(crate) async fn run_migrations(&self) -> Result<(), DatabaseError> {
        let steps: [(&str, String); 4] = [
            ("001_users", MIGRATION_001.to_string()),
            ("002_gestion", MIGRATION_002.to_string()),
            ("003_recipes", MIGRATION_003.to_string()),
            ("004_audit", audit_schema()),
        ];
        for (name, sql) in steps {
            self.conn
                .execute_batch(&sql)
                .await
                .map_err(|e| DatabaseError::Migration(format!("{name}: {e}")))?;
        }
        tracing::debug!("migrations applied");
        Ok(())
    }
}
