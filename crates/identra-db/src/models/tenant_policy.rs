//! Tenant authentication policy.
//!
//! Read-only collaborator for the orchestration services: a tenant's
//! policy row may force a single authentication mode tenant-wide, or be
//! absent, in which case the request decides.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::DbError;

/// Per-tenant authentication policy.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TenantAuthPolicy {
    pub tenant_id: Uuid,
    /// When set, every account in the tenant uses this mode tag.
    pub forced_auth_mode: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TenantAuthPolicy {
    /// Look up the tenant's policy row.
    pub async fn get(pool: &PgPool, tenant_id: Uuid) -> Result<Option<TenantAuthPolicy>, DbError> {
        let policy = sqlx::query_as("SELECT * FROM tenant_auth_policies WHERE tenant_id = $1")
            .bind(tenant_id)
            .fetch_optional(pool)
            .await?;

        Ok(policy)
    }

    /// The tenant's policy, or the non-forcing default when no row exists.
    pub async fn get_or_default(pool: &PgPool, tenant_id: Uuid) -> Result<TenantAuthPolicy, DbError> {
        Ok(Self::get(pool, tenant_id)
            .await?
            .unwrap_or_else(|| Self::default_for_tenant(tenant_id)))
    }

    /// Default policy: no forced mode.
    #[must_use]
    pub fn default_for_tenant(tenant_id: Uuid) -> TenantAuthPolicy {
        TenantAuthPolicy {
            tenant_id,
            forced_auth_mode: None,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_forces_nothing() {
        let tenant_id = Uuid::new_v4();
        let policy = TenantAuthPolicy::default_for_tenant(tenant_id);
        assert_eq!(policy.tenant_id, tenant_id);
        assert!(policy.forced_auth_mode.is_none());
    }
}
