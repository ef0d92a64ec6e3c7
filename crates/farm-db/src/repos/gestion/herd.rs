//! Herd repository.
//!
//! One row per animal, with the ear tag stock quantities held for it.

use chrono::{DateTime, Utc};

use farm_core::entities::Herd;
use farm_core::enums::{ActionKind, AnimalType, Sex, StockType};
use farm_core::ids::PREFIX_HERD;

use crate::error::DatabaseError;
use crate::helpers::{UpdateSql, format_datetime, parse_datetime, parse_enum, to_stored_precision};
use crate::service::FarmService;
use crate::updates::herd::HerdUpdate;

const SELECT_HERD: &str = "SELECT id, birth_date, ear_tag, sex, type, rebouclage_quantity, chevre_quantity, tiptag_quantity FROM herd";

/// Input for [`FarmService::create_herd`].
#[derive(Debug, Clone)]
pub struct NewHerd {
    pub birth_date: DateTime<Utc>,
    pub ear_tag: i64,
    pub sex: Sex,
    pub animal_type: AnimalType,
    pub rebouclage_quantity: i64,
    pub chevre_quantity: i64,
    pub tiptag_quantity: i64,
}

impl NewHerd {
    /// An animal with no ear tag stock.
    #[must_use]
    pub const fn new(birth_date: DateTime<Utc>, ear_tag: i64, sex: Sex, animal_type: AnimalType) -> Self {
        Self {
            birth_date,
            ear_tag,
            sex,
            animal_type,
            rebouclage_quantity: 0,
            chevre_quantity: 0,
            tiptag_quantity: 0,
        }
    }

    #[must_use]
    pub const fn with_stock(mut self, stock: StockType, quantity: i64) -> Self {
        match stock {
            StockType::Rebouclage => self.rebouclage_quantity = quantity,
            StockType::Chevre => self.chevre_quantity = quantity,
            StockType::Tiptag => self.tiptag_quantity = quantity,
        }
        self
    }
}

fn row_to_herd(row: &libsql::Row) -> Result<Herd, DatabaseError> {
    Ok(Herd {
        id: row.get::<String>(0)?,
        birth_date: parse_datetime(&row.get::<String>(1)?)?,
        ear_tag: row.get::<i64>(2)?,
        sex: parse_enum(&row.get::<String>(3)?)?,
        animal_type: parse_enum(&row.get::<String>(4)?)?,
        rebouclage_quantity: row.get::<i64>(5)?,
        chevre_quantity: row.get::<i64>(6)?,
        tiptag_quantity: row.get::<i64>(7)?,
    })
}

async fn fetch_herd(conn: &libsql::Connection, id: &str) -> Result<Herd, DatabaseError> {
    let mut rows = conn
        .query(&format!("{SELECT_HERD} WHERE id = ?1"), [id])
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    row_to_herd(&row)
}

impl FarmService {
    /// Register an animal and record its CREATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor does not exist.
    pub async fn create_herd(&self, actor_id: &str, input: NewHerd) -> Result<Herd, DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let herd = Herd {
                id: tx.generate_id(PREFIX_HERD).await?,
                birth_date: to_stored_precision(input.birth_date),
                ear_tag: input.ear_tag,
                sex: input.sex,
                animal_type: input.animal_type,
                rebouclage_quantity: input.rebouclage_quantity,
                chevre_quantity: input.chevre_quantity,
                tiptag_quantity: input.tiptag_quantity,
            };
            tx.conn()
                .execute(
                    "INSERT INTO herd (id, birth_date, ear_tag, sex, type, rebouclage_quantity, chevre_quantity, tiptag_quantity)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    libsql::params![
                        herd.id.as_str(),
                        format_datetime(&herd.birth_date),
                        herd.ear_tag,
                        herd.sex.as_str(),
                        herd.animal_type.as_str(),
                        herd.rebouclage_quantity,
                        herd.chevre_quantity,
                        herd.tiptag_quantity
                    ],
                )
                .await?;
            tx.record_and_link(ActionKind::Create, actor_id, &herd)
                .await?;
            Ok::<_, DatabaseError>(herd)
        }
        .await;
        tx.finish(result).await
    }

    /// Get an animal by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the animal does not exist.
    pub async fn get_herd(&self, id: &str) -> Result<Herd, DatabaseError> {
        fetch_herd(&*self.db().conn().await, id).await
    }

    /// List animals by ear tag, optionally of one type.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_herd(&self, animal_type: Option<AnimalType>) -> Result<Vec<Herd>, DatabaseError> {
        let conn = self.db().conn().await;
        let mut rows = match animal_type {
            Some(t) => {
                conn.query(
                    &format!("{SELECT_HERD} WHERE type = ?1 ORDER BY ear_tag, id"),
                    [t.as_str()],
                )
                .await?
            }
            None => {
                conn.query(&format!("{SELECT_HERD} ORDER BY ear_tag, id"), ())
                    .await?
            }
        };
        let mut herd = Vec::new();
        while let Some(row) = rows.next().await? {
            herd.push(row_to_herd(&row)?);
        }
        Ok(herd)
    }

    /// Total stock held across the herd for one ear tag category.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn herd_stock_total(&self, stock: StockType) -> Result<i64, DatabaseError> {
        Ok(self
            .list_herd(None)
            .await?
            .iter()
            .map(|h| h.stock_quantity(stock))
            .sum())
    }

    /// Apply `update` and record an UPDATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the animal does not exist.
    pub async fn update_herd(
        &self,
        actor_id: &str,
        id: &str,
        update: HerdUpdate,
    ) -> Result<Herd, DatabaseError> {
        let mut sql = UpdateSql::new();
        if let Some(birth_date) = update.birth_date {
            sql.set("birth_date", format_datetime(&to_stored_precision(birth_date)));
        }
        if let Some(ear_tag) = update.ear_tag {
            sql.set("ear_tag", ear_tag);
        }
        if let Some(sex) = update.sex {
            sql.set("sex", sex.as_str());
        }
        if let Some(t) = update.animal_type {
            sql.set("type", t.as_str());
        }
        if let Some(q) = update.rebouclage_quantity {
            sql.set("rebouclage_quantity", q);
        }
        if let Some(q) = update.chevre_quantity {
            sql.set("chevre_quantity", q);
        }
        if let Some(q) = update.tiptag_quantity {
            sql.set("tiptag_quantity", q);
        }
        if sql.is_empty() {
            return self.get_herd(id).await;
        }

        let mut tx = self.begin_audited().await?;
        let result = async {
            let (sql, params) = sql.finish("herd", "id", id);
            tx.conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            let herd = fetch_herd(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Update, actor_id, &herd)
                .await?;
            Ok::<_, DatabaseError>(herd)
        }
        .await;
        tx.finish(result).await
    }

    /// Record a DELETE action, then remove the animal.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the animal does not exist.
    pub async fn delete_herd(&self, actor_id: &str, id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let herd = fetch_herd(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Delete, actor_id, &herd)
                .await?;
            tx.conn()
                .execute("DELETE FROM herd WHERE id = ?1", [id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }
}
