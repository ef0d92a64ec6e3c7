//! Step repository.
//!
//! Steps are listed by step number. The attached file is stored as a path,
//! never read.

use farm_core::entities::Step;
use farm_core::enums::ActionKind;
use farm_core::ids::PREFIX_STEP;

use crate::error::DatabaseError;
use crate::helpers::{UpdateSql, get_opt_string};
use crate::repos::recipes::recipe::ensure_recipe;
use crate::service::FarmService;
use crate::updates::recipe::StepUpdate;

const SELECT_STEP: &str = "SELECT id, recipe_id, step_number, description, attached_file FROM steps";

/// Input for [`FarmService::create_step`].
#[derive(Debug, Clone)]
pub struct NewStep {
    pub recipe_id: Option<String>,
    pub step_number: i64,
    pub description: String,
    pub attached_file: Option<String>,
}

impl NewStep {
    #[must_use]
    pub fn new(step_number: i64, description: impl Into<String>) -> Self {
        Self {
            recipe_id: None,
            step_number,
            description: description.into(),
            attached_file: None,
        }
    }

    #[must_use]
    pub fn recipe(mut self, recipe_id: impl Into<String>) -> Self {
        self.recipe_id = Some(recipe_id.into());
        self
    }

    #[must_use]
    pub fn attached_file(mut self, path: impl Into<String>) -> Self {
        self.attached_file = Some(path.into());
        self
    }
}

fn row_to_step(row: &libsql::Row) -> Result<Step, DatabaseError> {
    Ok(Step {
        id: row.get::<String>(0)?,
        recipe_id: get_opt_string(row, 1)?,
        step_number: row.get::<i64>(2)?,
        description: row.get::<String>(3)?,
        attached_file: get_opt_string(row, 4)?,
    })
}

async fn fetch_step(conn: &libsql::Connection, id: &str) -> Result<Step, DatabaseError> {
    let mut rows = conn
        .query(&format!("{SELECT_STEP} WHERE id = ?1"), [id])
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    row_to_step(&row)
}

pub(crate) async fn fetch_steps_of(
    conn: &libsql::Connection,
    recipe_id: &str,
) -> Result<Vec<Step>, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("{SELECT_STEP} WHERE recipe_id = ?1 ORDER BY step_number, id"),
            [recipe_id],
        )
        .await?;
    let mut steps = Vec::new();
    while let Some(row) = rows.next().await? {
        steps.push(row_to_step(&row)?);
    }
    Ok(steps)
}

impl FarmService {
    /// Create a step and record its CREATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Reference` if the actor or the parent recipe
    /// does not exist.
    pub async fn create_step(&self, actor_id: &str, input: NewStep) -> Result<Step, DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            ensure_recipe(tx.conn(), input.recipe_id.as_deref()).await?;
            let step = Step {
                id: tx.generate_id(PREFIX_STEP).await?,
                recipe_id: input.recipe_id,
                step_number: input.step_number,
                description: input.description,
                attached_file: input.attached_file,
            };
            tx.conn()
                .execute(
                    "INSERT INTO steps (id, recipe_id, step_number, description, attached_file)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    libsql::params![
                        step.id.as_str(),
                        step.recipe_id.as_deref(),
                        step.step_number,
                        step.description.as_str(),
                        step.attached_file.as_deref()
                    ],
                )
                .await?;
            tx.record_and_link(ActionKind::Create, actor_id, &step)
                .await?;
            Ok::<_, DatabaseError>(step)
        }
        .await;
        tx.finish(result).await
    }

    /// Get a step by ID.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the step does not exist.
    pub async fn get_step(&self, id: &str) -> Result<Step, DatabaseError> {
        fetch_step(&*self.db().conn().await, id).await
    }

    /// List the steps of one recipe, ordered by step number.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_steps(&self, recipe_id: &str) -> Result<Vec<Step>, DatabaseError> {
        fetch_steps_of(&*self.db().conn().await, recipe_id).await
    }

    /// Apply `update` and record an UPDATE action.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the step does not exist, or
    /// `DatabaseError::Reference` if the new parent recipe does not exist.
    pub async fn update_step(
        &self,
        actor_id: &str,
        id: &str,
        update: StepUpdate,
    ) -> Result<Step, DatabaseError> {
        let new_recipe = update.recipe_id.clone();
        let mut sql = UpdateSql::new();
        if let Some(recipe_id) = update.recipe_id {
            sql.set("recipe_id", recipe_id);
        }
        if let Some(number) = update.step_number {
            sql.set("step_number", number);
        }
        if let Some(description) = update.description {
            sql.set("description", description);
        }
        if let Some(file) = update.attached_file {
            sql.set("attached_file", file);
        }
        if sql.is_empty() {
            return self.get_step(id).await;
        }

        let mut tx = self.begin_audited().await?;
        let result = async {
            if let Some(recipe_id) = new_recipe {
                ensure_recipe(tx.conn(), recipe_id.as_deref()).await?;
            }
            let (sql, params) = sql.finish("steps", "id", id);
            tx.conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            let step = fetch_step(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Update, actor_id, &step)
                .await?;
            Ok::<_, DatabaseError>(step)
        }
        .await;
        tx.finish(result).await
    }

    /// Record a DELETE action, then delete the step.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NoResult` if the step does not exist.
    pub async fn delete_step(&self, actor_id: &str, id: &str) -> Result<(), DatabaseError> {
        let mut tx = self.begin_audited().await?;
        let result = async {
            let step = fetch_step(tx.conn(), id).await?;
            tx.record_and_link(ActionKind::Delete, actor_id, &step)
                .await?;
            tx.conn()
                .execute("DELETE FROM steps WHERE id = ?1", [id])
                .await?;
            Ok::<_, DatabaseError>(())
        }
        .await;
        tx.finish(result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::recipes::recipe::NewRecipe;
    use crate::test_support::helpers::{create_test_actor, test_service};
    use crate::updates::recipe::StepUpdateBuilder;
    use farm_core::registry::EntityType;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn steps_list_in_number_order() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        let recipe = svc
            .create_recipe(&actor.id, NewRecipe::new("Tomme"))
            .await
            .unwrap();
        for (n, text) in [(3, "Affiner"), (1, "Cailler"), (2, "Presser")] {
            svc.create_step(&actor.id, NewStep::new(n, text).recipe(&recipe.id))
                .await
                .unwrap();
        }
        let texts: Vec<String> = svc
            .list_steps(&recipe.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.description)
            .collect();
        assert_eq!(texts, vec!["Cailler", "Presser", "Affiner"]);
    }

    #[tokio::test]
    async fn attached_file_roundtrips_and_clears() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        let step = svc
            .create_step(
                &actor.id,
                NewStep::new(1, "Photo du caillé").attached_file("steps/caille.jpg"),
            )
            .await
            .unwrap();
        assert!(step.id.starts_with("stp-"));
        assert_eq!(step.attached_file.as_deref(), Some("steps/caille.jpg"));

        let cleared = svc
            .update_step(
                &actor.id,
                &step.id,
                StepUpdateBuilder::new().attached_file(None).step_number(4).build(),
            )
            .await
            .unwrap();
        assert_eq!(cleared.attached_file, None);
        assert_eq!(cleared.step_number, 4);
    }

    #[tokio::test]
    async fn delete_step_keeps_history() {
        let svc = test_service().await;
        let actor = create_test_actor(&svc).await;
        let step = svc
            .create_step(&actor.id, NewStep::new(1, "Laver"))
            .await
            .unwrap();
        svc.delete_step(&actor.id, &step.id).await.unwrap();
        assert_eq!(svc.history(EntityType::Step, &step.id).await.unwrap().len(), 2);
        assert_eq!(svc.count_links(EntityType::Step).await.unwrap(), 0);
    }
}
