//! Projection assembly and directory record serialization.

use identra_core::AuthMode;
use identra_db::models::{Account, Group};
use identra_db::{DbError, GroupMembership, SubstitutionLink};
use identra_directory::{DirectoryError, RecordPayload};
use identra_events::{AccountProjection, GrantProjection, GroupProjection};
use sqlx::PgPool;

/// Load the committed relationship collections of an account:
/// (group names, substitute ids).
pub(crate) async fn load_account_collections(
    pool: &PgPool,
    account_id: &str,
) -> Result<(Vec<String>, Vec<String>), DbError> {
    let groups = GroupMembership::groups_for(pool, account_id)
        .await?
        .into_iter()
        .map(|g| g.name)
        .collect();
    let substitutes = SubstitutionLink::substitutes_for(pool, account_id).await?;
    Ok((groups, substitutes))
}

/// Build the account projection from an entity row and its collections.
pub(crate) fn account_projection(
    account: &Account,
    auth_mode: AuthMode,
    groups: Vec<String>,
    substitutes: Vec<String>,
) -> AccountProjection {
    AccountProjection {
        id: account.id.clone(),
        tenant_id: account.tenant_id,
        login: account.login.clone(),
        display_name: account.display_name.clone(),
        email: account.email.clone(),
        phone: account.phone.clone(),
        is_active: account.is_active,
        auth_mode,
        expires_at: account.expires_at,
        created_at: account.created_at,
        updated_at: account.updated_at,
        revision: account.revision,
        groups,
        substitutes,
    }
}

/// Build the group projection from an entity row and its collections.
pub(crate) fn group_projection(
    group: &Group,
    members: Vec<String>,
    grants: Vec<GrantProjection>,
) -> GroupProjection {
    GroupProjection {
        id: group.id.clone(),
        tenant_id: group.tenant_id,
        name: group.name.clone(),
        created_at: group.created_at,
        updated_at: group.updated_at,
        revision: group.revision,
        members,
        grants,
    }
}

/// The keeper's denormalized account record.
pub(crate) fn account_record(projection: &AccountProjection) -> Result<String, DirectoryError> {
    RecordPayload::new("account")
        .field("id", projection.id.as_str())
        .field("login", projection.login.as_str())
        .field("display_name", projection.display_name.as_str())
        .optional_field("email", projection.email.as_deref())
        .optional_field("phone", projection.phone.as_deref())
        .field("active", if projection.is_active { "true" } else { "false" })
        .field("auth_mode", projection.auth_mode.as_str())
        .optional_field(
            "expires_at",
            projection.expires_at.map(|t| t.to_rfc3339()).as_deref(),
        )
        .list("memberships", "group", projection.groups.clone())
        .list("substitutes", "account", projection.substitutes.clone())
        .to_xml()
}

/// The keeper's denormalized group record.
pub(crate) fn group_record(projection: &GroupProjection) -> Result<String, DirectoryError> {
    RecordPayload::new("group")
        .field("id", projection.id.as_str())
        .field("name", projection.name.as_str())
        .list("members", "member", projection.members.clone())
        .list(
            "grants",
            "grant",
            projection
                .grants
                .iter()
                .map(|g| format!("{}:{}", g.permission_id, g.operations)),
        )
        .to_xml()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_account() -> AccountProjection {
        AccountProjection {
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
            groups: vec!["Auditors".to_string()],
            substitutes: vec!["ACC2".to_string()],
        }
    }

    #[test]
    fn account_record_includes_fields_and_collections() {
        let xml = account_record(&sample_account()).unwrap();

        assert!(xml.starts_with("<account>"));
        assert!(xml.contains("<login>jane.doe</login>"));
        assert!(xml.contains("<auth_mode>password</auth_mode>"));
        assert!(xml.contains("<memberships><group>Auditors</group></memberships>"));
        assert!(xml.contains("<substitutes><account>ACC2</account></substitutes>"));
        // absent phone is omitted, not emitted empty
        assert!(!xml.contains("<phone>"));
    }

    #[test]
    fn group_record_encodes_grants_with_mask() {
        let projection = GroupProjection {
            id: "GRP1".to_string(),
            tenant_id: Uuid::new_v4(),
            name: "Auditors".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            revision: 1,
            members: vec!["jane.doe".to_string()],
            grants: vec![GrantProjection {
                permission_id: "reports.approve".to_string(),
                operations: 5,
            }],
        };

        let xml = group_record(&projection).unwrap();
        assert!(xml.contains("<grants><grant>reports.approve:5</grant></grants>"));
        assert!(xml.contains("<members><member>jane.doe</member></members>"));
    }
}
