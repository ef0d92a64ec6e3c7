//! Registry of auditable entity types.
//!
//! Every auditable schema is declared once in the `entity_types!` invocation
//! below. The declaration fixes the weak type tag stored in audit records, the
//! owning audit domain, the target table, and the strongly typed link table
//! with its foreign key column. Migrations generate the link tables from
//! [`EntityType::ALL`], so a new entity type only needs a new line here.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::AuditDomain;

macro_rules! entity_types {
    (
        $(
            $(#[$meta:meta])*
            $variant:ident {
                tag: $tag:literal,
                domain: $domain:ident,
                table: $table:literal,
                id_column: $id_column:literal,
                link_table: $link_table:literal,
                link_column: $link_column:literal $(,)?
            }
        ),+ $(,)?
    ) => {
        /// Type tag of an auditable entity, stored as the weak half of an
        /// audit record's target reference.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
        pub enum EntityType {
            $( $(#[$meta])* #[serde(rename = $tag)] $variant, )+
        }

        impl EntityType {
            /// Every registered entity type, in declaration order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $tag, )+
                }
            }

            /// Audit trail this entity type records into.
            #[must_use]
            pub const fn domain(self) -> AuditDomain {
                match self {
                    $( Self::$variant => AuditDomain::$domain, )+
                }
            }

            /// Table holding rows of this entity type.
            #[must_use]
            pub const fn table(self) -> &'static str {
                match self {
                    $( Self::$variant => $table, )+
                }
            }

            /// Primary key column of [`Self::table`].
            #[must_use]
            pub const fn id_column(self) -> &'static str {
                match self {
                    $( Self::$variant => $id_column, )+
                }
            }

            /// Join table binding audit records to rows of this type.
            #[must_use]
            pub const fn link_table(self) -> &'static str {
                match self {
                    $( Self::$variant => $link_table, )+
                }
            }

            /// Foreign key column in [`Self::link_table`] pointing at the row.
            #[must_use]
            pub const fn link_column(self) -> &'static str {
                match self {
                    $( Self::$variant => $link_column, )+
                }
            }
        }
    };
}

entity_types! {
    SupplierBilling {
        tag: "supplier_billing",
        domain: Gestion,
        table: "supplier_billings",
        id_column: "id",
        link_table: "supplier_billing_actions",
        link_column: "supplier_billing_id",
    },
    CustomerBilling {
        tag: "customer_billing",
        domain: Gestion,
        table: "customer_billings",
        id_column: "id",
        link_table: "customer_billing_actions",
        link_column: "customer_billing_id",
    },
    Delivery {
        tag: "delivery",
        domain: Gestion,
        table: "deliveries",
        id_column: "id",
        link_table: "delivery_actions",
        link_column: "delivery_id",
    },
    Production {
        tag: "production",
        domain: Gestion,
        table: "productions",
        id_column: "id",
        link_table: "production_actions",
        link_column: "production_id",
    },
    /// A single animal of the herd.
    Herd {
        tag: "herd",
        domain: Gestion,
        table: "herd",
        id_column: "id",
        link_table: "herd_actions",
        link_column: "herd_id",
    },
    Recipe {
        tag: "recipe",
        domain: Recipes,
        table: "recipes",
        id_column: "id",
        link_table: "recipe_actions",
        link_column: "recipe_id",
    },
    Ingredient {
        tag: "ingredient",
        domain: Recipes,
        table: "ingredients",
        id_column: "id",
        link_table: "ingredient_actions",
        link_column: "ingredient_id",
    },
    Step {
        tag: "step",
        domain: Recipes,
        table: "steps",
        id_column: "id",
        link_table: "step_actions",
        link_column: "step_id",
    },
    /// Cheese specialization of an ingredient, keyed by the ingredient id.
    Cheese {
        tag: "cheese",
        domain: Recipes,
        table: "cheeses",
        id_column: "ingredient_id",
        link_table: "cheese_actions",
        link_column: "cheese_id",
    },
    Wool {
        tag: "wool",
        domain: Recipes,
        table: "wools",
        id_column: "ingredient_id",
        link_table: "wool_actions",
        link_column: "wool_id",
    },
    Soap {
        tag: "soap",
        domain: Recipes,
        table: "soaps",
        id_column: "ingredient_id",
        link_table: "soap_actions",
        link_column: "soap_id",
    },
    Basketry {
        tag: "basketry",
        domain: Recipes,
        table: "basketries",
        id_column: "id",
        link_table: "basketry_actions",
        link_column: "basketry_id",
    },
    GoatSkin {
        tag: "goat_skin",
        domain: Recipes,
        table: "goat_skins",
        id_column: "id",
        link_table: "goat_skin_actions",
        link_column: "goat_skin_id",
    },
    Other {
        tag: "other",
        domain: Recipes,
        table: "others",
        id_column: "id",
        link_table: "other_actions",
        link_column: "other_id",
    },
}

impl EntityType {
    /// Entity types belonging to one audit domain.
    pub fn in_domain(domain: AuditDomain) -> impl Iterator<Item = Self> {
        Self::ALL.iter().copied().filter(move |t| t.domain() == domain)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
