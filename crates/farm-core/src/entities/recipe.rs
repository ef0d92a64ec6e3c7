use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Recipe {
    pub id: String,
    pub name: String,
}

/// An ingredient, optionally attached to a recipe. Deleted with its recipe.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Ingredient {
    pub id: String,
    pub recipe_id: Option<String>,
    pub name: String,
    pub quantity: i64,
    pub measure_unit: Option<String>,
}

/// A numbered preparation step. Steps of a recipe are listed by `step_number`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Step {
    pub id: String,
    pub recipe_id: Option<String>,
    pub step_number: i64,
    pub description: String,
    /// Path of an attached file, relative to the attachments root.
    pub attached_file: Option<String>,
}

crate::impl_auditable!(Recipe, Recipe, id);
crate::impl_auditable!(Ingredient, Ingredient, id);
crate::impl_auditable!(Step, Step, id);
