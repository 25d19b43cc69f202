//! Permission reference data.
//!
//! Permissions are immutable rows keyed by a dotted capability string
//! (e.g. `reports.approve`), seeded and maintained by schema migrations.
//! The orchestration services only read them.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::DbError;

/// A permission row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Permission {
    /// Dotted capability string, the business key.
    pub id: String,
    pub display_name: Option<String>,
}

impl Permission {
    /// Look up a permission by its capability string.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Permission>, DbError> {
        let permission = sqlx::query_as("SELECT * FROM permissions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(permission)
    }

    /// True if the permission exists.
    pub async fn exists(pool: &PgPool, id: &str) -> Result<bool, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM permissions WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(count > 0)
    }

    /// All permissions, ordered by key.
    pub async fn list(pool: &PgPool) -> Result<Vec<Permission>, DbError> {
        let permissions = sqlx::query_as("SELECT * FROM permissions ORDER BY id")
            .fetch_all(pool)
            .await?;

        Ok(permissions)
    }
}
