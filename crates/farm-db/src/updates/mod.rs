//! Update builder types for entity mutations.
//!
//! Each builder produces an update struct with `Option` fields. Only `Some`
//! fields generate SET clauses in the dynamic UPDATE SQL. An update with no
//! fields set is a no-op and records nothing.

pub mod billing;
pub mod delivery;
pub mod herd;
pub mod production;
pub mod recipe;
pub mod specialization;
