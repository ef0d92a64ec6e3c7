//! Product specialization repository.
//!
//! Cheese, wool and soap rows extend one ingredient and share its ID.
//! Basketry, goat skin and other products carry nothing but their own ID.

use farm_core::auditable::Auditable;
use farm_core::entities::{Basketry, Cheese, GoatSkin, OtherProduct, Soap, Wool};
use farm_core::enums::ActionKind;
use farm_core::ids::{PREFIX_BASKETRY, PREFIX_GOAT_SKIN, PREFIX_OTHER};

use crate::audit::AuditedTx;
use crate::error::DatabaseError;
use crate::helpers::{UpdateSql, get_bool, parse_enum};
use crate::repos::recipes::ingredient::fetch_ingredient;
use crate::service::FarmService;
use crate::updates::specialization::{CheeseUpdate, SoapUpdate, WoolUpdate};

const SELECT_CHEESE: &str = "SELECT ingredient_id, ferment_name, ferment_quantity, ferment_measure_unit, cooking_time, cooking_temperature, refining_time, refining_temperature, pressing, pressing_time, conservation_mode FROM cheeses";
const SELECT_WOOL: &str = "SELECT ingredient_id, fabrication_type, dyeing, dyeing_color, dyeing_preparation, drying_time FROM wools";
const SELECT_SOAP: &str = "SELECT ingredient_id, drying_time, dyeing, dyeing_color, dyeing_preparation FROM soaps";

fn row_to_cheese(row: &libsql::Row) -> Result<Cheese, DatabaseError> {
    Ok(Cheese {
        ingredient_id: row.get::<String>(0)?,
        ferment_name: row.get::<String>(1)?,
        ferment_quantity: row.get::<f64>(2)?,
        ferment_measure_unit: row.get::<String>(3)?,
        cooking_time: row.get::<i64>(4)?,
        cooking_temperature: row.get::<i64>(5)?,
        refining_time: row.get::<i64>(6)?,
        refining_temperature: row.get::<i64>(7)?,
        pressing: get_bool(row, 8)?,
        pressing_time: row.get::<i64>(9)?,
        conservation_mode: parse_enum(&row.get::<String>(10)?)?,
    })
}

fn row_to_wool(row: &libsql::Row) -> Result<Wool, DatabaseError> {
    Ok(Wool {
        ingredient_id: row.get::<String>(0)?,
        fabrication_type: parse_enum(&row.get::<String>(1)?)?,
        dyeing: get_bool(row, 2)?,
        dyeing_color: row.get::<String>(3)?,
        dyeing_preparation: row.get::<String>(4)?,
        drying_time: row.get::<i64>(5)?,
    })
}

fn row_to_soap(row: &libsql::Row) -> Result<Soap, DatabaseError> {
    Ok(Soap {
        ingredient_id: row.get::<String>(0)?,
        drying_time: row.get::<i64>(1)?,
        dyeing: get_bool(row, 2)?,
        dyeing_color: row.get::<String>(3)?,
        dyeing_preparation: row.get::<String>(4)?,
    })
}

async fn fetch_one<T>(
    conn: &libsql::Connection,
    select: &str,
    ingredient_id: &str,
    parse: fn(&libsql::Row) -> Result<T, DatabaseError>,
) -> Result<Option<T>, DatabaseError> {
    let mut rows = conn
        .query(&format!("{select} WHERE ingredient_id = ?1"), [ingredient_id])
        .await?;
    match rows.next().await? {
        Some(row) => Ok(Some(parse(&row)?)),
        None => Ok(None),
    }
}

/// Fail with `Reference` unless the ingredient being specialized exists.
async fn ensure_ingredient(conn: &libsql::Connection, id: &str) -> Result<(), DatabaseError> {
    match fetch_ingredient(conn, id).await {
        Ok(_) => Ok(()),
        Err(DatabaseError::NoResult) => Err(DatabaseError::Reference(format!(
            "ingredient {id} does not exist"
        ))),
        Err(e) => Err(e),
    }
}

/// Record DELETE for every specialization row of `ingredient_id`.
pub(crate) async fn record_specialization_removals(
    tx: &mut AuditedTx,
    actor_id: &str,
    ingredient_id: &str,
) -> Result<(), DatabaseError> {
    if let Some(cheese) = fetch_one(tx.conn(), SELECT_CHEESE, ingredient_id, row_to_cheese).await? {
        tx.record_and_link(ActionKind::Delete, actor_id, &cheese)
            .await?;
    }
    if let Some(wool) = fetch_one(tx.conn(), SELECT_WOOL, ingredient_id, row_to_wool).await? {
        tx.record_and_link(ActionKind::Delete, actor_id, &wool)
            .await?;
    }
    if let Some(soap) = fetch_one(tx.conn(), SELECT_SOAP, ingredient_id, row_to_soap).await? {
        tx.record_and_link(ActionKind::Delete, actor_id, &soap)
            .await?;
    }
    Ok(())
}

/// Products identified by nothing but a generated ID.
trait BareProduct: Auditable + Sized {
    const PREFIX: &'static str;
    fn from_id(id: String) -> Self;
}

impl BareProduct for Basketry {
    const PREFIX: &'static str = PREFIX_BASKETRY;
    fn from_id(id: String) -> Self {
        Self { id }
    }
}

impl BareProduct for GoatSkin {
    const PREFIX: &'static str = PREFIX_GOAT_SKIN;
    fn from_id(id: String) -> Self {
        Self { id }
    }
}

impl BareProduct for OtherProduct {
    const PREFIX: &'static str = PREFIX_OTHER;
    fn from_id(id: String) -> Self {
        Self { id }
    }
}

impl FarmService {
    // -----------------------------------------------------------------------
    // Cheese
    // -----------------------------------------------------------------------

    /// Specialize an ingredient as cheese and record the CREATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor or the ingredient does
    /// not exist, or `DatabaseError` if the ingredient is already a cheese.
    pub async fn create_cheese(&self, actor_id: &str, cheese: Cheese) -> Result<Cheese, DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            ensure_ingredient(tx.conn(), &cheese.ingredient_id).await?;
            tx.conn()
                .execute(
                    "INSERT INTO cheeses (ingredient_id, ferment_name, ferment_quantity, ferment_measure_unit,
                        cooking_time, cooking_temperature, refining_time, refining_temperature,
                        pressing, pressing_time, conservation_mode)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                    libsql::params![
                        cheese.ingredient_id.as_str(),
                        cheese.ferment_name.as_str(),
                        cheese.ferment_quantity,
                        cheese.ferment_measure_unit.as_str(),
                        cheese.cooking_time,
                        cheese.cooking_temperature,
                        cheese.refining_time,
                        cheese.refining_temperature,
                        i64::from(cheese.pressing),
                        cheese.pressing_time,
                        cheese.conservation_mode.as_str()
                    ],
                )
                .await?;
            tx.record_and_link(ActionKind::Create, actor_id, &cheese)
                .await?;
            Ok::<_, DatabaseError>(cheese)
        }
        .await;
        tx.finish(result).await
    }

    /// Get the cheese specialization of an ingredient.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the ingredient is not a cheese.
    pub async fn get_cheese(&self, ingredient_id: &str) -> Result<Cheese, DatabaseError> {
        fetch_one(&*self.db().conn().await, SELECT_CHEESE, ingredient_id, row_to_cheese)
            .await?
            .ok_or(DatabaseError::NoResult)
    }

    /// Apply `update` and record an UPDATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the ingredient is not a cheese.
    pub async fn update_cheese(
        &self,
        actor_id: &str,
        ingredient_id: &str,
        update: CheeseUpdate,
    ) -> Result<Cheese, DatabaseError> {
        let mut sql = UpdateSql::new();
        if let Some(v) = update.ferment_name {
            sql.set("ferment_name", v);
        }
        if let Some(v) = update.ferment_quantity {
            sql.set("ferment_quantity", v);
        }
        if let Some(v) = update.ferment_measure_unit {
            sql.set("ferment_measure_unit", v);
        }
        if let Some(v) = update.cooking_time {
            sql.set("cooking_time", v);
        }
        if let Some(v) = update.cooking_temperature {
            sql.set("cooking_temperature", v);
        }
        if let Some(v) = update.refining_time {
            sql.set("refining_time", v);
        }
        if let Some(v) = update.refining_temperature {
            sql.set("refining_temperature", v);
        }
        if let Some(v) = update.pressing {
            sql.set("pressing", i64::from(v));
        }
        if let Some(v) = update.pressing_time {
            sql.set("pressing_time", v);
        }
        if let Some(v) = update.conservation_mode {
            sql.set("conservation_mode", v.as_str());
        }
        if sql.is_empty() {
            return self.get_cheese(ingredient_id).await;
        }

        let mut tx = self.begin_audited().await?;
        let result = async {
            let (sql, params) = sql.finish("cheeses", "ingredient_id", ingredient_id);
            tx.conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            let cheese = fetch_one(tx.conn(), SELECT_CHEESE, ingredient_id, row_to_cheese)
                .await?
                .ok_or(DatabaseError::NoResult)?;
            tx.record_and_link(ActionKind::Update, actor_id, &cheese)
                .await?;
            Ok::<_, DatabaseError>(cheese)
        }
        .await;
        tx.finish(result).await
    }

    /// Record a DELETE action, then drop the cheese specialization.
    ///
    /// The ingredient itself is kept.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the ingredient is not a cheese.
    pub async fn delete_cheese(&self, actor_id: &str, ingredient_id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let cheese = fetch_one(tx.conn(), SELECT_CHEESE, ingredient_id, row_to_cheese)
                .await?
                .ok_or(DatabaseError::NoResult)?;
            tx.record_and_link(ActionKind::Delete, actor_id, &cheese)
                .await?;
            tx.conn()
                .execute("DELETE FROM cheeses WHERE ingredient_id = ?1", [ingredient_id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }

    // -----------------------------------------------------------------------
    // Wool
    // -----------------------------------------------------------------------

    /// Specialize an ingredient as wool and record the CREATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor or the ingredient does
    /// not exist.
    pub async fn create_wool(&self, actor_id: &str, wool: Wool) -> Result<Wool, DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            ensure_ingredient(tx.conn(), &wool.ingredient_id).await?;
            tx.conn()
                .execute(
                    "INSERT INTO wools (ingredient_id, fabrication_type, dyeing, dyeing_color, dyeing_preparation, drying_time)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    libsql::params![
                        wool.ingredient_id.as_str(),
                        wool.fabrication_type.as_str(),
                        i64::from(wool.dyeing),
                        wool.dyeing_color.as_str(),
                        wool.dyeing_preparation.as_str(),
                        wool.drying_time
                    ],
                )
                .await?;
            tx.record_and_link(ActionKind::Create, actor_id, &wool)
                .await?;
            Ok::<_, DatabaseError>(wool)
        }
        .await;
        tx.finish(result).await
    }

    /// Get the wool specialization of an ingredient.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the ingredient is not wool.
    pub async fn get_wool(&self, ingredient_id: &str) -> Result<Wool, DatabaseError> {
        fetch_one(&*self.db().conn().await, SELECT_WOOL, ingredient_id, row_to_wool)
            .await?
            .ok_or(DatabaseError::NoResult)
    }

    /// Apply `update` and record an UPDATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the ingredient is not wool.
    pub async fn update_wool(
        &self,
        actor_id: &str,
        ingredient_id: &str,
        update: WoolUpdate,
    ) -> Result<Wool, DatabaseError> {
        let mut sql = UpdateSql::new();
        if let Some(v) = update.fabrication_type {
            sql.set("fabrication_type", v.as_str());
        }
        if let Some(v) = update.dyeing {
            sql.set("dyeing", i64::from(v));
        }
        if let Some(v) = update.dyeing_color {
            sql.set("dyeing_color", v);
        }
        if let Some(v) = update.dyeing_preparation {
            sql.set("dyeing_preparation", v);
        }
        if let Some(v) = update.drying_time {
            sql.set("drying_time", v);
        }
        if sql.is_empty() {
            return self.get_wool(ingredient_id).await;
        }

        let mut tx = self.begin_audited().await?;
        let result = async {
            let (sql, params) = sql.finish("wools", "ingredient_id", ingredient_id);
            tx.conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            let wool = fetch_one(tx.conn(), SELECT_WOOL, ingredient_id, row_to_wool)
                .await?
                .ok_or(DatabaseError::NoResult)?;
            tx.record_and_link(ActionKind::Update, actor_id, &wool)
                .await?;
            Ok::<_, DatabaseError>(wool)
        }
        .await;
        tx.finish(result).await
    }

    /// Record a DELETE action, then drop the wool specialization.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the ingredient is not wool.
    pub async fn delete_wool(&self, actor_id: &str, ingredient_id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let wool = fetch_one(tx.conn(), SELECT_WOOL, ingredient_id, row_to_wool)
                .await?
                .ok_or(DatabaseError::NoResult)?;
            tx.record_and_link(ActionKind::Delete, actor_id, &wool)
                .await?;
            tx.conn()
                .execute("DELETE FROM wools WHERE ingredient_id = ?1", [ingredient_id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }

    // -----------------------------------------------------------------------
    // Soap
    // -----------------------------------------------------------------------

    /// Specialize an ingredient as soap and record the CREATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor or the ingredient does
    /// not exist.
    pub async fn create_soap(&self, actor_id: &str, soap: Soap) -> Result<Soap, DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            ensure_ingredient(tx.conn(), &soap.ingredient_id).await?;
            tx.conn()
                .execute(
                    "INSERT INTO soaps (ingredient_id, drying_time, dyeing, dyeing_color, dyeing_preparation)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    libsql::params![
                        soap.ingredient_id.as_str(),
                        soap.drying_time,
                        i64::from(soap.dyeing),
                        soap.dyeing_color.as_str(),
                        soap.dyeing_preparation.as_str()
                    ],
                )
                .await?;
            tx.record_and_link(ActionKind::Create, actor_id, &soap)
                .await?;
            Ok::<_, DatabaseError>(soap)
        }
        .await;
        tx.finish(result).await
    }

    /// Get the soap specialization of an ingredient.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the ingredient is not soap.
    pub async fn get_soap(&self, ingredient_id: &str) -> Result<Soap, DatabaseError> {
        fetch_one(&*self.db().conn().await, SELECT_SOAP, ingredient_id, row_to_soap)
            .await?
            .ok_or(DatabaseError::NoResult)
    }

    /// Apply `update` and record an UPDATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the ingredient is not soap.
    pub async fn update_soap(
        &self,
        actor_id: &str,
        ingredient_id: &str,
        update: SoapUpdate,
    ) -> Result<Soap, DatabaseError> {
        let mut sql = UpdateSql::new();
        if let Some(v) = update.drying_time {
            sql.set("drying_time", v);
        }
        if let Some(v) = update.dyeing {
            sql.set("dyeing", i64::from(v));
        }
        if let Some(v) = update.dyeing_color {
            sql.set("dyeing_color", v);
        }
        if let Some(v) = update.dyeing_preparation {
            sql.set("dyeing_preparation", v);
        }
        if sql.is_empty() {
            return self.get_soap(ingredient_id).await;
        }

        let mut tx = self.begin_audited().await?;
        let result = async {
            let (sql, params) = sql.finish("soaps", "ingredient_id", ingredient_id);
            tx.conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            let soap = fetch_one(tx.conn(), SELECT_SOAP, ingredient_id, row_to_soap)
                .await?
                .ok_or(DatabaseError::NoResult)?;
            tx.record_and_link(ActionKind::Update, actor_id, &soap)
                .await?;
            Ok::<_, DatabaseError>(soap)
        }
        .await;
        tx.finish(result).await
    }

    /// Record a DELETE action, then drop the soap specialization.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the ingredient is not soap.
    pub async fn delete_soap(&self, actor_id: &str, ingredient_id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let soap = fetch_one(tx.conn(), SELECT_SOAP, ingredient_id, row_to_soap)
                .await?
                .ok_or(DatabaseError::NoResult)?;
            tx.record_and_link(ActionKind::Delete, actor_id, &soap)
                .await?;
            tx.conn()
                .execute("DELETE FROM soaps WHERE ingredient_id = ?1", [ingredient_id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }

    // -----------------------------------------------------------------------
    // Basketry, goat skin, other
    // -----------------------------------------------------------------------

    async fn create_bare<T: BareProduct>(&self, actor_id: &str) -> Result<T, DatabaseError> {
        let entity = T::ENTITY_TYPE;
        let mut tx = self.begin_audited().await?;
        let result = async {
            let product = T::from_id(tx.generate_id(T::PREFIX).await?);
            tx.conn()
                .execute(
                    &format!("INSERT INTO {} (id) VALUES (?1)", entity.table()),
                    [product.audit_id()],
                )
                .await?;
            tx.record_and_link(ActionKind::Create, actor_id, &product)
                .await?;
            Ok::<_, DatabaseError>(product)
        }
        .await;
        tx.finish(result).await
    }

    async fn get_bare<T: BareProduct>(&self, id: &str) -> Result<T, DatabaseError> {
        let sql = format!("SELECT id FROM {} WHERE id = ?1", T::ENTITY_TYPE.table());
        let conn = self.db().conn().await;
        let mut rows = conn.query(&sql, [id]).await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(T::from_id(row.get::<String>(0)?))
    }

    async fn list_bare<T: BareProduct>(&self) -> Result<Vec<T>, DatabaseError> {
        let sql = format!("SELECT id FROM {} ORDER BY id", T::ENTITY_TYPE.table());
        let conn = self.db().conn().await;
        let mut rows = conn.query(&sql, ()).await?;
        let mut products = Vec::new();
        while let Some(row) = rows.next().await? {
            products.push(T::from_id(row.get::<String>(0)?));
        }
        Ok(products)
    }

    async fn delete_bare<T: BareProduct>(&self, actor_id: &str, id: &str) -> Result<(), DatabaseError> {
        let table = T::ENTITY_TYPE.table();
        let mut tx = self.begin_audited().await?;
        let result = async {
            let mut rows = tx
                .conn()
                .query(&format!("SELECT id FROM {table} WHERE id = ?1"), [id])
                .await?;
            let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
            let product = T::from_id(row.get::<String>(0)?);
            tx.record_and_link(ActionKind::Delete, actor_id, &product)
                .await?;
            tx.conn()
                .execute(&format!("DELETE FROM {table} WHERE id = ?1"), [id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }

    /// Register a basketry product.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor does not exist.
    pub async fn create_basketry(&self, actor_id: &str) -> Result<Basketry, DatabaseError> {
        self.create_bare(actor_id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the product does not exist.
    pub async fn get_basketry(&self, id: &str) -> Result<Basketry, DatabaseError> {
        self.get_bare(id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_basketries(&self) -> Result<Vec<Basketry>, DatabaseError> {
        self.list_bare().await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the product does not exist.
    pub async fn delete_basketry(&self, actor_id: &str, id: &str) -> Result<(), DatabaseError> {
        self.delete_bare::<Basketry>(actor_id, id).await
    }

    /// Register a goat skin.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor does not exist.
    pub async fn create_goat_skin(&self, actor_id: &str) -> Result<GoatSkin, DatabaseError> {
        self.create_bare(actor_id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the product does not exist.
    pub async fn get_goat_skin(&self, id: &str) -> Result<GoatSkin, DatabaseError> {
        self.get_bare(id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_goat_skins(&self) -> Result<Vec<GoatSkin>, DatabaseError> {
        self.list_bare().await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the product does not exist.
    pub async fn delete_goat_skin(&self, actor_id: &str, id: &str) -> Result<(), DatabaseError> {
        self.delete_bare::<GoatSkin>(actor_id, id).await
    }

    /// Register a product of no other category.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor does not exist.
    pub async fn create_other_product(&self, actor_id: &str) -> Result<OtherProduct, DatabaseError> {
        self.create_bare(actor_id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the product does not exist.
    pub async fn get_other_product(&self, id: &str) -> Result<OtherProduct, DatabaseError> {
        self.get_bare(id).await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_other_products(&self) -> Result<Vec<OtherProduct>, DatabaseError> {
        self.list_bare().await
    }

    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the product does not exist.
    pub async fn delete_other_product(&self, actor_id: &str, id: &str) -> Result<(), DatabaseError> {
        self.delete_bare::<OtherProduct>(actor_id, id).await
    }
}
