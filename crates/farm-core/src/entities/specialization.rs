//! Per-product specializations of an ingredient.
//!
//! Cheese, wool and soap rows share their primary key with the ingredient they
//! specialize and disappear with it. Basketry, goat skin and other products
//! carry no attributes yet.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ConservationMode, FabricationType};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Cheese {
    pub ingredient_id: String,
    pub ferment_name: String,
    pub ferment_quantity: f64,
    pub ferment_measure_unit: String,
    pub cooking_time: i64,
    pub cooking_temperature: i64,
    pub refining_time: i64,
    pub refining_temperature: i64,
    pub pressing: bool,
    pub pressing_time: i64,
    pub conservation_mode: ConservationMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Wool {
    pub ingredient_id: String,
    pub fabrication_type: FabricationType,
    pub dyeing: bool,
    pub dyeing_color: String,
    pub dyeing_preparation: String,
    pub drying_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Soap {
    pub ingredient_id: String,
    pub drying_time: i64,
    pub dyeing: bool,
    pub dyeing_color: String,
    pub dyeing_preparation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Basketry {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct GoatSkin {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct OtherProduct {
    pub id: String,
}

crate::impl_auditable!(Cheese, Cheese, ingredient_id);
crate::impl_auditable!(Wool, Wool, ingredient_id);
crate::impl_auditable!(Soap, Soap, ingredient_id);
crate::impl_auditable!(Basketry, Basketry, id);
crate::impl_auditable!(GoatSkin, GoatSkin, id);
crate::impl_auditable!(OtherProduct, Other, id);
