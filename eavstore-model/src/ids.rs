//! Identifier types for the four EAV tables.
//!
//! Every table is keyed by an SQLite `INTEGER PRIMARY KEY`, so the ids are
//! thin wrappers over `i64`. Keeping them distinct stops an entity id from
//! being handed to a lookup that expects a property id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw row id.
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Returns the raw row id.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

row_id! {
    /// Row id of an entity (a user-defined record type).
    EntityId
}

row_id! {
    /// Row id of a property definition.
    PropertyId
}

row_id! {
    /// Row id of an instance.
    InstanceId
}

row_id! {
    /// Row id of a single instance/property value binding.
    InstanceDataId
}
