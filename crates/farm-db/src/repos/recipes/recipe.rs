//! Recipe repository.
//!
//! Deleting a recipe removes its ingredients, their specializations, and its
//! steps through foreign key cascades. Each of those rows gets its own DELETE
//! record before the cascade runs.

use serde::Serialize;

use farm_core::entities::{Ingredient, Recipe, Step};
use farm_core::enums::ActionKind;
use farm_core::ids::PREFIX_RECIPE;

use crate::error::DatabaseError;
use crate::helpers::UpdateSql;
use crate::repos::recipes::ingredient::{fetch_ingredients_of, record_ingredient_removal};
use crate::repos::recipes::step::fetch_steps_of;
use crate::service::FarmService;
use crate::updates::recipe::RecipeUpdate;

/// Input for [`FarmService::create_recipe`].
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub name: String,
}

impl NewRecipe {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A recipe with its ingredients and ordered steps.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RecipeDetail {
    pub recipe: Recipe,
    pub ingredients: Vec<Ingredient>,
    pub steps: Vec<Step>,
}

fn row_to_recipe(row: &libsql::Row) -> Result<Recipe, DatabaseError> {
    Ok(Recipe {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
    })
}

pub(crate) async fn fetch_recipe(
    conn: &libsql::Connection,
    id: &str,
) -> Result<Recipe, DatabaseError> {
    let mut rows = conn
        .query("SELECT id, name FROM recipes WHERE id = ?1", [id])
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    row_to_recipe(&row)
}

/// Fail with `Reference` unless the optional parent recipe exists.
pub(crate) async fn ensure_recipe(
    conn: &libsql::Connection,
    recipe_id: Option<&str>,
) -> Result<(), DatabaseError> {
    let Some(id) = recipe_id else {
        return Ok(());
    };
    match fetch_recipe(conn, id).await {
        Ok(_) => Ok(()),
        Err(DatabaseError::NoResult) => Err(DatabaseError::Reference(format!(
            "recipe {id} does not exist"
        ))),
        Err(e) => Err(e),
    }
}

impl FarmService {
    /// Create a recipe and record its CREATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor does not exist.
    pub async fn create_recipe(
        &self,
        actor_id: &str,
        input: NewRecipe,
    ) -> Result<Recipe, DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let recipe = Recipe {
                id: tx.generate_id(PREFIX_RECIPE).await?,
                name: input.name,
            };
            tx.conn()
                .execute(
                    "INSERT INTO recipes (id, name) VALUES (?1, ?2)",
                    libsql::params![recipe.id.as_str(), recipe.name.as_str()],
                )
                .await?;
            tx.record_and_link(ActionKind::Create, actor_id, &recipe)
                .await?;
            Ok::<_, DatabaseError>(recipe)
        }
        .await;
        tx.finish(result).await
    }

    /// Get a recipe by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the recipe does not exist.
    pub async fn get_recipe(&self, id: &str) -> Result<Recipe, DatabaseError> {
        fetch_recipe(&*self.db().conn().await, id).await
    }

    /// Get a recipe together with its ingredients and steps.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the recipe does not exist.
    pub async fn get_recipe_detail(&self, id: &str) -> Result<RecipeDetail, DatabaseError> {
        let conn = self.db().conn().await;
        Ok(RecipeDetail {
            recipe: fetch_recipe(&conn, id).await?,
            ingredients: fetch_ingredients_of(&conn, id).await?,
            steps: fetch_steps_of(&conn, id).await?,
        })
    }

    /// List recipes by name.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_recipes(&self) -> Result<Vec<Recipe>, DatabaseError> {
        let conn = self.db().conn().await;
        let mut rows = conn
            .query("SELECT id, name FROM recipes ORDER BY name, id", ())
            .await?;
        let mut recipes = Vec::new();
        while let Some(row) = rows.next().await? {
            recipes.push(row_to_recipe(&row)?);
        }
        Ok(recipes)
    }

    /// Apply `update` and record an UPDATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the recipe does not exist.
    pub async fn update_recipe(
        &self,
        actor_id: &str,
        id: &str,
        update: RecipeUpdate,
    ) -> Result<Recipe, DatabaseError> {
        let mut sql = UpdateSql::new();
        if let Some(name) = update.name {
            sql.set("name", name);
        }
        if sql.is_empty() {
            return self.get_recipe(id).await;
        }

        let mut tx = self.begin_audited().await?;
        let result = async {
            let (sql, params) = sql.finish("recipes", "id", id);
            tx.conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            let recipe = fetch_recipe(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Update, actor_id, &recipe)
                .await?;
            Ok::<_, DatabaseError>(recipe)
        }
        .await;
        tx.finish(result).await
    }

    /// Delete a recipe and everything it owns, recording one DELETE per row.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the recipe does not exist.
    pub async fn delete_recipe(&self, actor_id: &str, id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let recipe = fetch_recipe(tx.conn(), id).await?;
            for ingredient in fetch_ingredients_of(tx.conn(), id).await? {
                record_ingredient_removal(&mut tx, actor_id, &ingredient).await?;
            }
            for step in fetch_steps_of(tx.conn(), id).await? {
                tx.record_and_link(ActionKind::Delete, actor_id, &step)
                    .await?;
            }
            tx.record_and_link(ActionKind::Delete, actor_id, &recipe)
                .await?;
            tx.conn()
                .execute("DELETE FROM recipes WHERE id = ?1", [id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }
}
