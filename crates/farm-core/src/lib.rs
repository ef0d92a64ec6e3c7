//! # farm-core
//!
//! Core types shared by the farm workspace crates:
//! - Entity structs for the farm ("gestion") and recipe domains
//! - Audit records and strongly typed audit links
//! - The registry of auditable entity types and the `Auditable` capability
//! - Fixed choice enums with their stored codes
//! - ID prefix constants and cross-cutting error types

pub mod auditable;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod registry;
