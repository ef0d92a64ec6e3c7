//! ID prefixes for generated identifiers.
//!
//! IDs are formatted as `{prefix}-{8 hex chars}`, e.g. `dlv-a3f8b2c1`.
//! Cheese, wool and soap rows have no prefix of their own: they are keyed by
//! the ingredient they specialize.

pub const PREFIX_USER: &str = "usr";
pub const PREFIX_SUPPLIER_BILLING: &str = "sbl";
pub const PREFIX_CUSTOMER_BILLING: &str = "cbl";
pub const PREFIX_DELIVERY: &str = "dlv";
pub const PREFIX_PRODUCTION: &str = "prd";
pub const PREFIX_HERD: &str = "hrd";
pub const PREFIX_RECIPE: &str = "rcp";
pub const PREFIX_INGREDIENT: &str = "ing";
pub const PREFIX_STEP: &str = "stp";
pub const PREFIX_BASKETRY: &str = "bsk";
pub const PREFIX_GOAT_SKIN: &str = "gsk";
pub const PREFIX_OTHER: &str = "oth";
pub const PREFIX_GESTION_ACTION: &str = "gac";
pub const PREFIX_RECIPES_ACTION: &str = "rac";

pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_USER,
    PREFIX_SUPPLIER_BILLING,
    PREFIX_CUSTOMER_BILLING,
    PREFIX_DELIVERY,
    PREFIX_PRODUCTION,
    PREFIX_HERD,
    PREFIX_RECIPE,
    PREFIX_INGREDIENT,
    PREFIX_STEP,
    PREFIX_BASKETRY,
    PREFIX_GOAT_SKIN,
    PREFIX_OTHER,
    PREFIX_GESTION_ACTION,
    PREFIX_RECIPES_ACTION,
];

/// Format a prefixed ID from a prefix and a hex suffix.
#[must_use]
pub fn format_id(prefix: &str, hex: &str) -> String {
    format!("{prefix}-{hex}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn prefixes_are_unique() {
        let set: HashSet<_> = ALL_PREFIXES.iter().collect();
        assert_eq!(set.len(), ALL_PREFIXES.len());
    }

    #[test]
    fn prefixes_are_three_chars() {
        for prefix in ALL_PREFIXES {
            assert_eq!(prefix.len(), 3, "prefix '{prefix}' should be 3 chars");
        }
    }

    #[test]
    fn format_id_joins_with_dash() {
        assert_eq!(format_id(PREFIX_DELIVERY, "a3f8b2c1"), "dlv-a3f8b2c1");
    }
}
