//! Production batch repository.

use farm_core::entities::Production;
use farm_core::enums::{ActionKind, ProductionType};
use farm_core::ids::PREFIX_PRODUCTION;

use crate::error::DatabaseError;
use crate::helpers::{UpdateSql, format_datetime, now_micros, parse_datetime, parse_enum, to_stored_precision};
use crate::service::FarmService;
use crate::updates::production::ProductionUpdate;

const SELECT_PRODUCTION: &str = "SELECT id, date, type FROM productions";

fn row_to_production(row: &libsql::Row) -> Result<Production, DatabaseError> {
    Ok(Production {
        id: row.get::<String>(0)?,
        date: parse_datetime(&row.get::<String>(1)?)?,
        production_type: parse_enum(&row.get::<String>(2)?)?,
    })
}

async fn fetch_production(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Production, DatabaseError> {
    let mut rows = conn
        .query(&format!("{SELECT_PRODUCTION} WHERE id = ?1"), [id])
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    row_to_production(&row)
}

impl FarmService {
    /// Create a production batch dated now.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor does not exist.
    pub async fn create_production(
        &self,
        actor_id: &str,
        production_type: ProductionType,
    ) -> Result<Production, DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let production = Production {
                id: tx.generate_id(PREFIX_PRODUCTION).await?,
                date: now_micros(),
                production_type,
            };
            tx.conn()
                .execute(
                    "INSERT INTO productions (id, date, type) VALUES (?1, ?2, ?3)",
                    libsql::params![
                        production.id.as_str(),
                        format_datetime(&production.date),
                        production.production_type.as_str()
                    ],
                )
                .await?;
            tx.record_and_link(ActionKind::Create, actor_id, &production)
                .await?;
            Ok::<_, DatabaseError>(production)
        }
        .await;
        tx.finish(result).await
    }

    /// Get a production batch by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the batch does not exist.
    pub async fn get_production(&self, id: &str) -> Result<Production, DatabaseError> {
        fetch_production(&*self.db().conn().await, id).await
    }

    /// List production batches, newest first, optionally of one type.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_productions(
        &self,
        production_type: Option<ProductionType>,
        limit: u32,
    ) -> Result<Vec<Production>, DatabaseError> {
        let conn = self.db().conn().await;
        let mut rows = match production_type {
            Some(t) => {
                conn.query(
                    &format!("{SELECT_PRODUCTION} WHERE type = ?1 ORDER BY date DESC, id LIMIT ?2"),
                    libsql::params![t.as_str(), i64::from(limit)],
                )
                .await?
            }
            None => {
                conn.query(
                    &format!("{SELECT_PRODUCTION} ORDER BY date DESC, id LIMIT ?1"),
                    [i64::from(limit)],
                )
                .await?
            }
        };
        let mut productions = Vec::new();
        while let Some(row) = rows.next().await? {
            productions.push(row_to_production(&row)?);
        }
        Ok(productions)
    }

    /// Apply `update` and record an UPDATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the batch does not exist.
    pub async fn update_production(
        &self,
        actor_id: &str,
        id: &str,
        update: ProductionUpdate,
    ) -> Result<Production, DatabaseError> {
        let mut sql = UpdateSql::new();
        if let Some(date) = update.date {
            sql.set("date", format_datetime(&to_stored_precision(date)));
        }
        if let Some(t) = update.production_type {
            sql.set("type", t.as_str());
        }
        if sql.is_empty() {
            return self.get_production(id).await;
        }

        let mut tx = self.begin_audited().await?;
        let result = async {
            let (sql, params) = sql.finish("productions", "id", id);
            tx.conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            let production = fetch_production(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Update, actor_id, &production)
                .await?;
            Ok::<_, DatabaseError>(production)
        }
        .await;
        tx.finish(result).await
    }

    /// Record a DELETE action, then delete the batch.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the batch does not exist.
    pub async fn delete_production(&self, actor_id: &str, id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let production = fetch_production(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Delete, actor_id, &production)
                .await?;
            tx.conn()
                .execute("DELETE FROM productions WHERE id = ?1", [id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }
}
