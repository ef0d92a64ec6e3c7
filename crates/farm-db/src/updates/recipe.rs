//! Recipe, ingredient and step update builders.
//!
//! Nullable columns use `Option<Option<T>>`: `Some(None)` clears the value.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Default)]
pub struct RecipeUpdateBuilder(RecipeUpdate);

impl RecipeUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.0.name = Some(val.into());
        self
    }

    #[must_use]
    pub fn build(self) -> RecipeUpdate {
        self.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure_unit: Option<Option<String>>,
}

#[derive(Default)]
pub struct IngredientUpdateBuilder(IngredientUpdate);

impl IngredientUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn recipe_id(mut self, val: Option<String>) -> Self {
        self.0.recipe_id = Some(val);
        self
    }

    #[must_use]
    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.0.name = Some(val.into());
        self
    }

    #[must_use]
    pub fn quantity(mut self, val: i64) -> Self {
        self.0.quantity = Some(val);
        self
    }

    #[must_use]
    pub fn measure_unit(mut self, val: Option<String>) -> Self {
        self.0.measure_unit = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> IngredientUpdate {
        self.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_file: Option<Option<String>>,
}

#[derive(Default)]
pub struct StepUpdateBuilder(StepUpdate);

impl StepUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn recipe_id(mut self, val: Option<String>) -> Self {
        self.0.recipe_id = Some(val);
        self
    }

    #[must_use]
    pub fn step_number(mut self, val: i64) -> Self {
        self.0.step_number = Some(val);
        self
    }

    #[must_use]
    pub fn description(mut self, val: impl Into<String>) -> Self {
        self.0.description = Some(val.into());
        self
    }

    #[must_use]
    pub fn attached_file(mut self, val: Option<String>) -> Self {
        self.0.attached_file = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> StepUpdate {
        self.0
    }
}
