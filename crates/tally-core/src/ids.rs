//! Identifier types for tally.
//!
//! This module provides strongly-typed identifiers for customers and usage
//! records. Both are opaque strings: customer ids come from seed data or
//! callers, record ids are caller-supplied idempotency keys (or generated
//! UUIDs when the caller omits one).
//!
//! # Macro-based ID Types
//!
//! The `string_id_type!` macro reduces boilerplate for string-based
//! identifier types, ensuring consistent validation, serialization, and
//! display across them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum accepted identifier length in bytes.
pub const MAX_ID_LEN: usize = 128;

/// Macro to define an opaque string identifier type with standard trait
/// implementations.
///
/// The generated newtype validates on construction (non-empty, length
/// capped at [`MAX_ID_LEN`]) and implements:
/// - `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Serialize`, `Deserialize` (as string)
/// - `FromStr`, `Display`, `Debug`
/// - `TryFrom<String>`, `Into<String>`, `AsRef<str>`
macro_rules! string_id_type {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Construct from a raw string, validating it.
            ///
            /// # Errors
            ///
            /// Returns an error if the string is empty or too long.
            pub fn new(raw: impl Into<String>) -> Result<Self, IdError> {
                let raw = raw.into();
                if raw.trim().is_empty() {
                    return Err(IdError::Empty);
                }
                if raw.len() > MAX_ID_LEN {
                    return Err(IdError::TooLong { len: raw.len() });
                }
                Ok(Self(raw))
            }

            /// Return the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id_type!(
    CustomerId,
    "A customer identifier (opaque string).\n\nCustomer ids are assigned at seed time (`cust_<uuid>`) or supplied by callers creating customers through the API."
);
string_id_type!(
    RecordId,
    "A usage record identifier, doubling as the idempotency key.\n\nCallers that want safe retries supply their own stable value; otherwise the service generates a UUID at ingestion."
);

impl CustomerId {
    /// Generate a fresh customer id with the `cust_` prefix.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!("cust_{}", uuid::Uuid::new_v4()))
    }
}

impl RecordId {
    /// Generate a fresh record id.
    ///
    /// Used when a caller submits usage without an idempotency key; such a
    /// submission can never be deduplicated against a retry.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Errors that can occur when parsing identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// The input is empty or whitespace-only.
    #[error("identifier must not be empty")]
    Empty,

    /// The input exceeds [`MAX_ID_LEN`] bytes.
    #[error("identifier is {len} bytes, maximum is {MAX_ID_LEN}")]
    TooLong {
        /// Actual length of the rejected input.
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_id_roundtrip() {
        let id = CustomerId::new("cust_42").unwrap();
        let parsed = CustomerId::from_str(id.as_str()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn record_id_serde_json() {
        let id = RecordId::generate();
        let json = serde_json::to_string(&id).unwrap();
        let parsed: RecordId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn empty_id_rejected() {
        assert_eq!(RecordId::new(""), Err(IdError::Empty));
        assert_eq!(CustomerId::new("   "), Err(IdError::Empty));
    }

    #[test]
    fn oversized_id_rejected() {
        let raw = "x".repeat(MAX_ID_LEN + 1);
        assert!(matches!(
            RecordId::new(raw),
            Err(IdError::TooLong { len }) if len == MAX_ID_LEN + 1
        ));
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(RecordId::generate(), RecordId::generate());
        assert!(CustomerId::generate().as_str().starts_with("cust_"));
    }

    #[test]
    fn deserializing_empty_id_fails() {
        let result: Result<CustomerId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
