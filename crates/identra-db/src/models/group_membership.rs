//! Group membership model.
//!
//! Many-to-many join between accounts and groups. Pure relationship
//! records with no lifecycle of their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::DbError;

/// A membership linking an account to a group.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GroupMembership {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub group_id: String,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
}

/// Member info for projections.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MemberInfo {
    pub account_id: String,
    pub login: String,
    pub display_name: String,
}

/// Group info for an account's groups list.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct MembershipGroupInfo {
    pub group_id: String,
    pub name: String,
}

impl GroupMembership {
    /// Add an account to a group. Returns false if already a member.
    pub async fn add_member(
        conn: &mut PgConnection,
        tenant_id: Uuid,
        group_id: &str,
        account_id: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            INSERT INTO group_memberships (tenant_id, group_id, account_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (group_id, account_id) DO NOTHING
            ",
        )
        .bind(tenant_id)
        .bind(group_id)
        .bind(account_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove an account from a group. Returns false if not a member.
    pub async fn remove_member(
        conn: &mut PgConnection,
        group_id: &str,
        account_id: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            DELETE FROM group_memberships
            WHERE group_id = $1 AND account_id = $2
            ",
        )
        .bind(group_id)
        .bind(account_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Check membership.
    pub async fn is_member(
        pool: &PgPool,
        group_id: &str,
        account_id: &str,
    ) -> Result<bool, DbError> {
        let row: Option<(i64,)> = sqlx::query_as(
            r"
            SELECT 1 FROM group_memberships
            WHERE group_id = $1 AND account_id = $2
            ",
        )
        .bind(group_id)
        .bind(account_id)
        .fetch_optional(pool)
        .await?;

        Ok(row.is_some())
    }

    /// All members of a group, ordered by login.
    pub async fn members_of(pool: &PgPool, group_id: &str) -> Result<Vec<MemberInfo>, DbError> {
        let members = sqlx::query_as(
            r"
            SELECT a.id AS account_id, a.login, a.display_name
            FROM group_memberships gm
            JOIN accounts a ON gm.account_id = a.id
            WHERE gm.group_id = $1
            ORDER BY a.login
            ",
        )
        .bind(group_id)
        .fetch_all(pool)
        .await?;

        Ok(members)
    }

    /// All groups an account belongs to, ordered by name.
    pub async fn groups_for(
        pool: &PgPool,
        account_id: &str,
    ) -> Result<Vec<MembershipGroupInfo>, DbError> {
        let groups = sqlx::query_as(
            r"
            SELECT g.id AS group_id, g.name
            FROM group_memberships gm
            JOIN groups g ON gm.group_id = g.id
            WHERE gm.account_id = $1
            ORDER BY g.name
            ",
        )
        .bind(account_id)
        .fetch_all(pool)
        .await?;

        Ok(groups)
    }

    /// Remove every membership of a group (group deletion path).
    pub async fn remove_all_for_group(
        conn: &mut PgConnection,
        group_id: &str,
    ) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM group_memberships WHERE group_id = $1")
            .bind(group_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Remove every membership of an account (account deletion path).
    pub async fn remove_all_for_account(
        conn: &mut PgConnection,
        account_id: &str,
    ) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM group_memberships WHERE account_id = $1")
            .bind(account_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }

    /// Number of members in a group.
    pub async fn count_members(pool: &PgPool, group_id: &str) -> Result<i64, DbError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM group_memberships WHERE group_id = $1")
                .bind(group_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }
}
