//! Delivery repository.
//!
//! Milk deliveries. `date` is stamped on creation; `date_delivery` is the
//! day the milk was handed over.

use chrono::{DateTime, Utc};

use farm_core::entities::Delivery;
use farm_core::enums::ActionKind;
use farm_core::ids::PREFIX_DELIVERY;

use crate::error::DatabaseError;
use crate::helpers::{UpdateSql, format_datetime, now_micros, parse_datetime, to_stored_precision};
use crate::service::FarmService;
use crate::updates::delivery::DeliveryUpdate;

const SELECT_DELIVERY: &str = "SELECT id, date, date_delivery, liter, comment FROM deliveries";

/// Input for [`FarmService::create_delivery`].
#[derive(Debug, Clone)]
pub struct NewDelivery {
    pub date_delivery: DateTime<Utc>,
    pub liter: i64,
    pub comment: String,
}

impl NewDelivery {
    #[must_use]
    pub fn new(date_delivery: DateTime<Utc>, liter: i64, comment: impl Into<String>) -> Self {
        Self {
            date_delivery,
            liter,
            comment: comment.into(),
        }
    }

    /// One liter, no comment.
    #[must_use]
    pub fn on(date_delivery: DateTime<Utc>) -> Self {
        Self::new(date_delivery, 1, "")
    }
}

fn row_to_delivery(row: &libsql::Row) -> Result<Delivery, DatabaseError> {
    Ok(Delivery {
        id: row.get::<String>(0)?,
        date: parse_datetime(&row.get::<String>(1)?)?,
        date_delivery: parse_datetime(&row.get::<String>(2)?)?,
        liter: row.get::<i64>(3)?,
        comment: row.get::<String>(4)?,
    })
}

async fn fetch_delivery(conn: &libsql::Connection, id: &str) -> Result<Delivery, DatabaseError> {
    let mut rows = conn
        .query(&format!("{SELECT_DELIVERY} WHERE id = ?1"), [id])
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    row_to_delivery(&row)
}

impl FarmService {
    /// Create a delivery and record its CREATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor does not exist, or
    /// `DatabaseError` if the writes fail. Nothing persists on error.
    pub async fn create_delivery(
        &self,
        actor_id: &str,
        input: NewDelivery,
    ) -> Result<Delivery, DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let delivery = Delivery {
                id: tx.generate_id(PREFIX_DELIVERY).await?,
                date: now_micros(),
                date_delivery: to_stored_precision(input.date_delivery),
                liter: input.liter,
                comment: input.comment,
            };
            tx.conn()
                .execute(
                    "INSERT INTO deliveries (id, date, date_delivery, liter, comment)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    libsql::params![
                        delivery.id.as_str(),
                        format_datetime(&delivery.date),
                        format_datetime(&delivery.date_delivery),
                        delivery.liter,
                        delivery.comment.as_str()
                    ],
                )
                .await?;
            tx.record_and_link(ActionKind::Create, actor_id, &delivery)
                .await?;
            Ok::<_, DatabaseError>(delivery)
        }
        .await;
        tx.finish(result).await
    }

    /// Get a delivery by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the delivery does not exist.
    pub async fn get_delivery(&self, id: &str) -> Result<Delivery, DatabaseError> {
        fetch_delivery(&*self.db().conn().await, id).await
    }

    /// List deliveries, most recent delivery date first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_deliveries(&self, limit: u32) -> Result<Vec<Delivery>, DatabaseError> {
        let conn = self.db().conn().await;
        let mut rows = conn
            .query(
                &format!("{SELECT_DELIVERY} ORDER BY date_delivery DESC, id LIMIT ?1"),
                [i64::from(limit)],
            )
            .await?;
        let mut deliveries = Vec::new();
        while let Some(row) = rows.next().await? {
            deliveries.push(row_to_delivery(&row)?);
        }
        Ok(deliveries)
    }

    /// Apply `update` and record an UPDATE action.
    ///
    /// An empty update writes nothing and returns the current row.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the delivery does not exist.
    pub async fn update_delivery(
        &self,
        actor_id: &str,
        id: &str,
        update: DeliveryUpdate,
    ) -> Result<Delivery, DatabaseError> {
        let mut sql = UpdateSql::new();
        if let Some(date_delivery) = update.date_delivery {
            sql.set(
                "date_delivery",
                format_datetime(&to_stored_precision(date_delivery)),
            );
        }
        if let Some(liter) = update.liter {
            sql.set("liter", liter);
        }
        if let Some(comment) = update.comment {
            sql.set("comment", comment);
        }
        if sql.is_empty() {
            return self.get_delivery(id).await;
        }

        let mut tx = self.begin_audited().await?;
        let result = async {
            let (sql, params) = sql.finish("deliveries", "id", id);
            tx.conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            let delivery = fetch_delivery(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Update, actor_id, &delivery)
                .await?;
            Ok::<_, DatabaseError>(delivery)
        }
        .await;
        tx.finish(result).await
    }

    /// Record a DELETE action, then delete the delivery.
    ///
    /// The record outlives the row; its link is removed with the row.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the delivery does not exist.
    pub async fn delete_delivery(&self, actor_id: &str, id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let delivery = fetch_delivery(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Delete, actor_id, &delivery)
                .await?;
            tx.conn()
                .execute("DELETE FROM deliveries WHERE id = ?1", [id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }
}
