//! Farm management repositories, audited in the gestion trail.

pub mod billing;
pub mod delivery;
pub mod herd;
pub mod production;
