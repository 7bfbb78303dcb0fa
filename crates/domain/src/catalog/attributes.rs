//! Closed attribute sets for catalog products.
//!
//! Each set serializes to the lowercase (or, for badges, uppercase) wire
//! name used by the storefront and parses back from it, so unknown values
//! are rejected at the boundary instead of reaching storage.

use serde::{Deserialize, Serialize};

use crate::error::ParseValueError;

macro_rules! closed_set {
    (
        $(#[$meta:meta])*
        $name:ident, $field:literal, $rename:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = $rename)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Returns the wire name.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseValueError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(ParseValueError::new($field, other)),
                }
            }
        }
    };
}

closed_set! {
    /// Product category.
    Category, "category", "lowercase" {
        Backpack => "backpack",
        Handbag => "handbag",
        Laptop => "laptop",
        Travel => "travel",
        Tote => "tote",
        Messenger => "messenger",
    }
}

closed_set! {
    /// Primary material of a product.
    Material, "material", "lowercase" {
        Leather => "leather",
        Canvas => "canvas",
        Nylon => "nylon",
        Polyester => "polyester",
    }
}

closed_set! {
    /// Product colour.
    Color, "color", "lowercase" {
        Black => "black",
        Brown => "brown",
        Blue => "blue",
        Red => "red",
        Green => "green",
    }
}

closed_set! {
    /// Merchandising badge shown on the product card.
    Badge, "badge", "UPPERCASE" {
        New => "NEW",
        Sale => "SALE",
        Hot => "HOT",
        Premium => "PREMIUM",
        Luxury => "LUXURY",
    }
}

impl Default for Badge {
    fn default() -> Self {
        Badge::New
    }
}
