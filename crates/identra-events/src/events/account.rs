//! Account lifecycle events.
//!
//! Published after the primary-store write is durably committed, never on
//! rollback.

use crate::event::Event;
use crate::projection::AccountProjection;
use identra_core::AuthMode;
use serde::{Deserialize, Serialize};

/// Published when an account is created or updated.
///
/// Carries the full current projection plus the resolved authentication
/// mode and credential hash, so consumers need no read-back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountUpserted {
    pub projection: AccountProjection,
    /// The effective mode after tenant policy resolution.
    pub auth_mode: AuthMode,
    pub credential_hash: String,
    /// The keeper's entry code from the directory sync, when one exists.
    pub directory_sync_hash: Option<String>,
}

impl Event for AccountUpserted {
    const TOPIC: &'static str = "identra.identity.account.upserted";
    const EVENT_TYPE: &'static str = "identra.identity.account.upserted";
}

/// Published when an account is deleted. Carries only the identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountDeleted {
    pub account_id: String,
}

impl Event for AccountDeleted {
    const TOPIC: &'static str = "identra.identity.account.deleted";
    const EVENT_TYPE: &'static str = "identra.identity.account.deleted";
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn upserted_serialization_round_trip() {
        let event = AccountUpserted {
            projection: AccountProjection {
                id: "ACC1".to_string(),
                tenant_id: Uuid::new_v4(),
                login: "jane.doe".to_string(),
                display_name: "Jane Doe".to_string(),
                email: Some("jane@example.com".to_string()),
                phone: None,
                is_active: true,
                auth_mode: AuthMode::Password,
                expires_at: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                revision: 1,
                groups: Vec::new(),
                substitutes: Vec::new(),
            },
            auth_mode: AuthMode::Password,
            credential_hash: "$argon2id$...".to_string(),
            directory_sync_hash: Some("c0ffee".to_string()),
        };

        let json = serde_json::to_string(&event).unwrap();
        let restored: AccountUpserted = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.projection.login, "jane.doe");
        assert_eq!(restored.directory_sync_hash.as_deref(), Some("c0ffee"));
    }

    #[test]
    fn topics() {
        assert_eq!(AccountUpserted::TOPIC, "identra.identity.account.upserted");
        assert_eq!(AccountDeleted::TOPIC, "identra.identity.account.deleted");
    }
}
