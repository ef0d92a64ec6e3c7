//! Recipe repositories, audited in the recipes trail.

pub mod ingredient;
pub mod recipe;
pub mod specialization;
pub mod step;
