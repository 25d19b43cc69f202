//! Group permission grants.
//!
//! Join of group and permission plus an operation bitmask encoding which
//! sub-operations the grant allows within that group.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::DbError;

/// Read sub-operation bit.
pub const OP_READ: i32 = 1;
/// Write sub-operation bit.
pub const OP_WRITE: i32 = 2;
/// Approve sub-operation bit.
pub const OP_APPROVE: i32 = 4;

/// True if `mask` allows all bits of `op`.
#[must_use]
pub fn mask_allows(mask: i32, op: i32) -> bool {
    mask & op == op
}

/// A permission grant held by a group.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GroupPermissionGrant {
    pub id: Uuid,
    pub group_id: String,
    pub permission_id: String,
    /// Operation bitmask (`OP_READ` | `OP_WRITE` | `OP_APPROVE`).
    pub operations: i32,
    pub created_at: DateTime<Utc>,
}

/// A grant to apply, before it has a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantSpec {
    pub permission_id: String,
    pub operations: i32,
}

impl GroupPermissionGrant {
    /// Replace the group's grants with the given set, inside an open
    /// transaction. Callers validate that every permission exists; the
    /// foreign key is the backstop.
    pub async fn replace_for_group(
        conn: &mut PgConnection,
        group_id: &str,
        grants: &[GrantSpec],
    ) -> Result<(), DbError> {
        sqlx::query("DELETE FROM group_permission_grants WHERE group_id = $1")
            .bind(group_id)
            .execute(&mut *conn)
            .await?;

        for grant in grants {
            sqlx::query(
                r"
                INSERT INTO group_permission_grants (group_id, permission_id, operations)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(group_id)
            .bind(&grant.permission_id)
            .bind(grant.operations)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// The group's grants, ordered by permission key.
    pub async fn list_for_group(
        pool: &PgPool,
        group_id: &str,
    ) -> Result<Vec<GroupPermissionGrant>, DbError> {
        let grants = sqlx::query_as(
            r"
            SELECT * FROM group_permission_grants
            WHERE group_id = $1
            ORDER BY permission_id
            ",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;

        Ok(grants)
    }

    /// Remove every grant of a group (group deletion path).
    pub async fn remove_all_for_group(
        conn: &mut PgConnection,
        group_id: &str,
    ) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM group_permission_grants WHERE group_id = $1")
            .bind(group_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_combines_bits() {
        let mask = OP_READ | OP_APPROVE;
        assert!(mask_allows(mask, OP_READ));
        assert!(mask_allows(mask, OP_APPROVE));
        assert!(!mask_allows(mask, OP_WRITE));
        assert!(!mask_allows(mask, OP_READ | OP_WRITE));
    }

    #[test]
    fn empty_mask_allows_nothing() {
        assert!(!mask_allows(0, OP_READ));
        assert!(!mask_allows(0, OP_WRITE));
        // the zero op is trivially allowed
        assert!(mask_allows(0, 0));
    }
}
