//! Ingredient repository.
//!
//! An ingredient may belong to a recipe and may carry one cheese, wool or
//! soap specialization keyed by its ID.

use farm_core::entities::Ingredient;
use farm_core::enums::ActionKind;
use farm_core::ids::PREFIX_INGREDIENT;

use crate::audit::AuditedTx;
use crate::error::DatabaseError;
use crate::helpers::{UpdateSql, get_opt_string};
use crate::repos::recipes::recipe::ensure_recipe;
use crate::repos::recipes::specialization::record_specialization_removals;
use crate::service::FarmService;
use crate::updates::recipe::IngredientUpdate;

const SELECT_INGREDIENT: &str = "SELECT id, recipe_id, name, quantity, measure_unit FROM ingredients";

/// Input for [`FarmService::create_ingredient`].
#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub recipe_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub measure_unit: Option<String>,
}

impl NewIngredient {
    /// A standalone ingredient with quantity 1 and no unit.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            recipe_id: None,
            name: name.into(),
            quantity: 1,
            measure_unit: None,
        }
    }

    #[must_use]
    pub fn recipe(mut self, recipe_id: impl Into<String>) -> Self {
        self.recipe_id = Some(recipe_id.into());
        self
    }

    #[must_use]
    pub fn quantity(mut self, quantity: i64, measure_unit: impl Into<String>) -> Self {
        self.quantity = quantity;
        self.measure_unit = Some(measure_unit.into());
        self
    }
}

fn row_to_ingredient(row: &libsql::Row) -> Result<Ingredient, DatabaseError> {
    Ok(Ingredient {
        id: row.get::<String>(0)?,
        recipe_id: get_opt_string(row, 1)?,
        name: row.get::<String>(2)?,
        quantity: row.get::<i64>(3)?,
        measure_unit: get_opt_string(row, 4)?,
    })
}

pub(crate) async fn fetch_ingredient(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Ingredient, DatabaseError> {
    let mut rows = conn
        .query(&format!("{SELECT_INGREDIENT} WHERE id = ?1"), [id])
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    row_to_ingredient(&row)
}

pub(crate) async fn fetch_ingredients_of(
    conn: &libsql::Connection,
    recipe_id: &str,
) -> Result<Vec<Ingredient>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("{SELECT_INGREDIENT} WHERE recipe_id = ?1 ORDER BY name, id"),
            [recipe_id],
        )
        .await?;
    let mut ingredients = Vec::new();
    while let Some(row) = rows.next().await? {
        ingredients.push(row_to_ingredient(&row)?);
    }
    Ok(ingredients)
}

/// Record DELETE for an ingredient and any specialization it carries.
///
/// Does not delete anything; the caller's DELETE cascades to the rows.
pub(crate) async fn record_ingredient_removal(
    tx: &mut AuditedTx,
    actor_id: &str,
    ingredient: &Ingredient,
) -> Result<(), DatabaseError> {
    record_specialization_removals(tx, actor_id, &ingredient.id).await?;
    tx.record_and_link(ActionKind::Delete, actor_id, ingredient)
        .await?;
    Ok(())
}

impl FarmService {
    /// Create an ingredient and record its CREATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor or the parent recipe
    /// does not exist.
    pub async fn create_ingredient(
        &self,
        actor_id: &str,
        input: NewIngredient,
    ) -> Result<Ingredient, DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            ensure_recipe(tx.conn(), input.recipe_id.as_deref()).await?;
            let ingredient = Ingredient {
                id: tx.generate_id(PREFIX_INGREDIENT).await?,
                recipe_id: input.recipe_id,
                name: input.name,
                quantity: input.quantity,
                measure_unit: input.measure_unit,
            };
            tx.conn()
                .execute(
                    "INSERT INTO ingredients (id, recipe_id, name, quantity, measure_unit)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    libsql::params![
                        ingredient.id.as_str(),
                        ingredient.recipe_id.as_deref(),
                        ingredient.name.as_str(),
                        ingredient.quantity,
                        ingredient.measure_unit.as_deref()
                    ],
                )
                .await?;
            tx.record_and_link(ActionKind::Create, actor_id, &ingredient)
                .await?;
            Ok::<_, DatabaseError>(ingredient)
        }
        .await;
        tx.finish(result).await
    }

    /// Get an ingredient by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the ingredient does not exist.
    pub async fn get_ingredient(&self, id: &str) -> Result<Ingredient, DatabaseError> {
        fetch_ingredient(&*self.db().conn().await, id).await
    }

    /// List the ingredients of one recipe, by name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_ingredients(&self, recipe_id: &str) -> Result<Vec<Ingredient>, DatabaseError> {
        fetch_ingredients_of(&*self.db().conn().await, recipe_id).await
    }

    /// Apply `update` and record an UPDATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the ingredient does not exist, or
    /// `DatabaseError::Reference` if the new parent recipe does not exist.
    pub async fn update_ingredient(
        &self,
        actor_id: &str,
        id: &str,
        update: IngredientUpdate,
    ) -> Result<Ingredient, DatabaseError> {
        let new_recipe = update.recipe_id.clone();
        let mut sql = UpdateSql::new();
        if let Some(recipe_id) = update.recipe_id {
            sql.set("recipe_id", recipe_id);
        }
        if let Some(name) = update.name {
            sql.set("name", name);
        }
        if let Some(quantity) = update.quantity {
            sql.set("quantity", quantity);
        }
        if let Some(unit) = update.measure_unit {
            sql.set("measure_unit", unit);
        }
        if sql.is_empty() {
            return self.get_ingredient(id).await;
        }

        let mut tx = self.begin_audited().await?;
        let result = async {
            if let Some(recipe_id) = new_recipe {
                ensure_recipe(tx.conn(), recipe_id.as_deref()).await?;
            }
            let (sql, params) = sql.finish("ingredients", "id", id);
            tx.conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            let ingredient = fetch_ingredient(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Update, actor_id, &ingredient)
                .await?;
            Ok::<_, DatabaseError>(ingredient)
        }
        .await;
        tx.finish(result).await
    }

    /// Delete an ingredient and its specializations, recording one DELETE per
    /// row.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the ingredient does not exist.
    pub async fn delete_ingredient(&self, actor_id: &str, id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let ingredient = fetch_ingredient(tx.conn(), id).await?;
            record_ingredient_removal(&mut tx, actor_id, &ingredient).await?;
            tx.conn()
                .execute("DELETE FROM ingredients WHERE id = ?1", [id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }
}
