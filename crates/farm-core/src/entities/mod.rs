//! Entity structs for all farm and recipe domain objects.
//!
//! Each entity maps to a table in the libSQL database (see `farm-db`'s
//! migrations). All structs derive `Serialize`, `Deserialize`, and `JsonSchema`
//! for JSON roundtrip and schema validation.

mod actor;
mod audit;
mod billing;
mod delivery;
mod herd;
mod production;
mod recipe;
mod specialization;

pub use actor::Actor;
pub use audit::{AuditLink, AuditRecord};
pub use billing::{CustomerBilling, SupplierBilling};
pub use delivery::Delivery;
pub use herd::Herd;
pub use production::Production;
pub use recipe::{Ingredient, Recipe, Step};
pub use specialization::{Basketry, Cheese, GoatSkin, OtherProduct, Soap, Wool};
