//! Authentication mode tag shared between the store, events, and services.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// How an account authenticates.
///
/// Stored as a lowercase string tag on the account row and carried verbatim
/// in event payloads. A tenant's auth policy may force a single mode for
/// every account in that tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Local credential: the account carries a password hash.
    Password,
    /// Authentication is delegated to an external identity provider;
    /// the account must carry an email address for correlation.
    Federated,
}

impl AuthMode {
    /// The string tag stored in the `auth_mode` column.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Password => "password",
            AuthMode::Federated => "federated",
        }
    }

    /// Parse the stored tag back into the enum.
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "password" => Some(AuthMode::Password),
            "federated" => Some(AuthMode::Federated),
            _ => None,
        }
    }
}

impl Display for AuthMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trip() {
        for mode in [AuthMode::Password, AuthMode::Federated] {
            assert_eq!(AuthMode::parse(mode.as_str()), Some(mode));
        }
    }

    #[test]
    fn parse_rejects_unknown_tag() {
        assert_eq!(AuthMode::parse("windows"), None);
        assert_eq!(AuthMode::parse(""), None);
    }

    #[test]
    fn serde_uses_snake_case_tag() {
        let json = serde_json::to_string(&AuthMode::Federated).unwrap();
        assert_eq!(json, "\"federated\"");
    }
}
