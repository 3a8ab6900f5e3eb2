//! Newtype wrappers for type safety
//!
//! Commvault identifies clients and subclients by numeric ids, but the API
//! is queried with their string form. Integers are still accepted for
//! backward compatibility and are coerced to strings with a deprecation
//! warning.

use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Newtype Wrappers for Type Safety
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", $label)]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[doc = concat!("Get the ", $label, " as a string slice")]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<&String> for $name {
            fn from(s: &String) -> Self {
                Self(s.clone())
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }

        string_id!(@ints $name, $label, u32 u64 i32 i64 usize);
    };
    (@ints $name:ident, $label:literal, $($int:ty)*) => {
        $(
            impl From<$int> for $name {
                fn from(id: $int) -> Self {
                    log::warn!(
                        "deprecated: integer {} {id} accepted for backward compatibility only",
                        $label
                    );
                    Self(id.to_string())
                }
            }
        )*
    };
}

string_id!(
    /// Client id newtype
    ClientId,
    "client id"
);

string_id!(
    /// Subclient id newtype
    SubclientId,
    "subclient id"
);
