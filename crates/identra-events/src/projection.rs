//! Entity projections carried in upserted events.
//!
//! Projections are the full current state of an entity as consumers see
//! it, assembled by the orchestration services after a committed write.

use chrono::{DateTime, Utc};
use identra_core::AuthMode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Full account state for consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProjection {
    pub id: String,
    pub tenant_id: Uuid,
    pub login: String,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub auth_mode: AuthMode,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i64,
    /// Names of the groups the account belongs to.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Ids of the accounts named as substitutes.
    #[serde(default)]
    pub substitutes: Vec<String>,
}

/// One permission grant inside a group projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantProjection {
    pub permission_id: String,
    /// Operation bitmask.
    pub operations: i32,
}

/// Full group state for consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupProjection {
    pub id: String,
    pub tenant_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i64,
    /// Logins of the member accounts.
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub grants: Vec<GrantProjection>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_projection_serializes_mode_tag() {
        let projection = AccountProjection {
            id: "ACC1".to_string(),
            tenant_id: Uuid::new_v4(),
            login: "jane.doe".to_string(),
            display_name: "Jane Doe".to_string(),
            email: None,
            phone: None,
            is_active: true,
            auth_mode: AuthMode::Password,
            expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            revision: 1,
            groups: vec!["Auditors".to_string()],
            substitutes: Vec::new(),
        };

        let json = serde_json::to_string(&projection).unwrap();
        assert!(json.contains("\"auth_mode\":\"password\""));
        assert!(json.contains("\"groups\":[\"Auditors\"]"));
    }

    #[test]
    fn collections_default_to_empty_on_deserialize() {
        let json = serde_json::json!({
            "id": "GRP1",
            "tenant_id": Uuid::new_v4(),
            "name": "Auditors",
            "created_at": Utc::now(),
            "updated_at": Utc::now(),
            "revision": 3
        });

        let projection: GroupProjection = serde_json::from_value(json).unwrap();
        assert!(projection.members.is_empty());
        assert!(projection.grants.is_empty());
    }
}
