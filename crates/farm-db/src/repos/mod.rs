//! Repository modules implementing CRUD operations for all farm entities.
//!
//! Each module adds methods to `FarmService` via `impl FarmService` blocks.
//! Mutating methods take the acting user's ID and write exactly one audit
//! record and link per affected row, in the same transaction as the row.

pub mod actor;
pub mod audit;
pub mod gestion;
pub mod recipes;
