//! Action kinds, actor roles, audit domains, and the fixed choice sets stored
//! on farm and recipe entities.
//!
//! Every enum serializes to the exact code stored in SQL (`"CREATE"`, `"Cash"`,
//! `"CHV"`, ...), so rows can be parsed back with serde. `label()` returns the
//! human-facing display name where it differs from the stored code.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// Kind of mutation recorded in an audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Create,
    Update,
    Delete,
}

impl ActionKind {
    pub const ALL: &'static [Self] = &[Self::Create, Self::Update, Self::Delete];

    /// Return the string representation used in SQL storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

impl FromStr for ActionKind {
    type Err = CoreError;

    /// Parse a stored action code. Anything outside the three fixed kinds is a
    /// validation error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATE" => Ok(Self::Create),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            other => Err(CoreError::Validation(format!(
                "unknown action kind '{other}' (expected CREATE, UPDATE or DELETE)"
            ))),
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ActorRole
// ---------------------------------------------------------------------------

/// Role of a user performing mutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActorRole {
    #[default]
    Admin,
    Sales,
}

impl ActorRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Sales => "SALES",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Sales => "Commercial",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AuditDomain
// ---------------------------------------------------------------------------

/// One of the two independent audit trails.
///
/// Farm entities ("gestion") and recipe entities each keep their own action
/// table and their own set of link tables. Records never cross domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditDomain {
    Gestion,
    Recipes,
}

impl AuditDomain {
    pub const ALL: &'static [Self] = &[Self::Gestion, Self::Recipes];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gestion => "gestion",
            Self::Recipes => "recipes",
        }
    }

    /// Table holding this domain's audit records.
    #[must_use]
    pub const fn actions_table(self) -> &'static str {
        match self {
            Self::Gestion => "gestion_model_actions",
            Self::Recipes => "recipes_model_actions",
        }
    }

    /// ID prefix for this domain's audit records.
    #[must_use]
    pub const fn record_prefix(self) -> &'static str {
        match self {
            Self::Gestion => crate::ids::PREFIX_GESTION_ACTION,
            Self::Recipes => crate::ids::PREFIX_RECIPES_ACTION,
        }
    }
}

impl fmt::Display for AuditDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Stored choice sets
// ---------------------------------------------------------------------------

/// Declares a choice enum whose variants map to a stored code and a label.
macro_rules! choices {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => ($code:literal, $label:literal) ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        pub enum $name {
            $( #[serde(rename = $code)] $variant, )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $code, )+
                }
            }

            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choices! {
    /// How a supplier or customer bill was paid.
    FinancingType {
        Cash => ("Cash", "Cash"),
        Bank => ("Bank", "Bank"),
        Other => ("Other", "Other"),
    }
}

choices! {
    /// Kind of goods produced by a production batch.
    ProductionType {
        Cheese => ("Cheese", "Fromage"),
        Wool => ("Laine", "Laine"),
        Soap => ("Savon", "Savon"),
        Basketry => ("Vannerie", "Vannerie"),
        GoatSkins => ("Peau", "Peau de chèvre"),
        Other => ("Autre", "Autre"),
    }
}

choices! {
    Sex {
        Female => ("F", "Female"),
        Male => ("M", "Male"),
    }
}

choices! {
    /// Life stage of a herd animal.
    AnimalType {
        Cabri => ("C", "Cabri"),
        Chevrette => ("CH", "Chevrette"),
        Chevre => ("CHV", "Chèvre"),
        Bouc => ("B", "Bouc"),
    }
}

choices! {
    /// Ear tag stock category; each maps to one quantity column on a herd row.
    StockType {
        Rebouclage => ("RE", "Rebouclage"),
        Chevre => ("CHV", "Chevre électronique et conventionnelle"),
        Tiptag => ("CA", "Tiptag"),
    }
}

choices! {
    ConservationMode {
        Natural => ("Naturel", "Naturel"),
        Vacuum => ("Sous-vide", "Sous-vide"),
        Wax => ("cire", "cire"),
        Other => ("autre", "autre"),
    }
}

choices! {
    /// Wool crafting technique.
    FabricationType {
        Weaving => ("tissage", "tissage"),
        Felting => ("feutrage", "feutrage"),
        Spinning => ("filage", "filage"),
        Other => ("autre", "autre"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
