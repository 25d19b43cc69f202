//! Prefixed Entity Identifiers
//!
//! Account and group identifiers are short, prefixed, generator-issued
//! strings (`ACC…`, `GRP…`). The newtype pattern keeps the two id spaces
//! apart at compile time.
//!
//! # Example
//!
//! ```
//! use identra_core::{AccountId, GroupId};
//!
//! let account = AccountId::generate();
//! assert!(account.as_str().starts_with("ACC"));
//!
//! fn requires_group(id: &GroupId) -> &str {
//!     id.as_str()
//! }
//!
//! let group = GroupId::generate();
//! let _ = requires_group(&group);
//! // requires_group(&account); // does not compile
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Number of hex characters issued after the prefix.
const ID_ENTROPY_LEN: usize = 20;

/// Error type for identifier parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {id_type}: '{value}' (expected prefix '{expected_prefix}')")]
pub struct ParseIdError {
    /// The identifier type that failed to parse.
    pub id_type: &'static str,
    /// The prefix the identifier type requires.
    pub expected_prefix: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Macro to define a prefixed, generator-issued identifier type.
macro_rules! define_prefixed_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// The fixed prefix for this identifier type.
            pub const PREFIX: &'static str = $prefix;

            /// Issue a new identifier: prefix plus generated hex suffix.
            #[must_use]
            pub fn generate() -> Self {
                let entropy = Uuid::new_v4().simple().to_string();
                Self(format!("{}{}", $prefix, &entropy[..ID_ENTROPY_LEN].to_uppercase()))
            }

            /// Validate and wrap an externally supplied identifier.
            pub fn parse(value: &str) -> Result<Self, ParseIdError> {
                let suffix = value.strip_prefix($prefix).unwrap_or("");
                if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(ParseIdError {
                        id_type: stringify!($name),
                        expected_prefix: $prefix,
                        value: value.to_string(),
                    });
                }
                Ok(Self(value.to_string()))
            }

            /// The identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_prefixed_id!(
    /// Identifier of an account (`ACC` prefix).
    AccountId,
    "ACC"
);

define_prefixed_id!(
    /// Identifier of a group (`GRP` prefix).
    GroupId,
    "GRP"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_carry_prefix_and_are_unique() {
        let a = AccountId::generate();
        let b = AccountId::generate();
        assert!(a.as_str().starts_with("ACC"));
        assert_eq!(a.as_str().len(), "ACC".len() + 20);
        assert_ne!(a, b);
    }

    #[test]
    fn parse_accepts_generated_ids() {
        let id = GroupId::generate();
        let parsed = GroupId::parse(id.as_str()).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_wrong_prefix() {
        let err = AccountId::parse("GRP1234ABCD").unwrap_err();
        assert_eq!(err.expected_prefix, "ACC");
        assert!(err.to_string().contains("AccountId"));
    }

    #[test]
    fn parse_rejects_bare_prefix_and_junk() {
        assert!(AccountId::parse("ACC").is_err());
        assert!(AccountId::parse("").is_err());
        assert!(AccountId::parse("ACC12 34").is_err());
    }

    #[test]
    fn serde_is_transparent() {
        let id = AccountId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_str()));
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
