//! Group entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::concurrency::ConcurrencyResolver;
use crate::error::DbError;

/// A group row in the primary store.
///
/// `name` keeps its display casing; uniqueness is enforced
/// case-insensitively by a functional index.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub tenant_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i64,
}

/// Fields required to insert a new group.
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub id: String,
    pub tenant_id: Uuid,
    pub name: String,
}

impl Group {
    /// Insert a new group inside an open transaction.
    pub async fn insert(conn: &mut PgConnection, new: &NewGroup) -> Result<Group, DbError> {
        let group = sqlx::query_as(
            r"
            INSERT INTO groups (id, tenant_id, name)
            VALUES ($1, $2, $3)
            RETURNING *
            ",
        )
        .bind(&new.id)
        .bind(new.tenant_id)
        .bind(&new.name)
        .fetch_one(&mut *conn)
        .await?;

        Ok(group)
    }

    /// Look up a group by id within a tenant.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: Uuid,
        id: &str,
    ) -> Result<Option<Group>, DbError> {
        let group = sqlx::query_as(
            r"
            SELECT * FROM groups
            WHERE id = $1 AND tenant_id = $2
            ",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;

        Ok(group)
    }

    /// Look up a group by name, case-insensitively.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Group>, DbError> {
        let group = sqlx::query_as(
            r"
            SELECT * FROM groups
            WHERE LOWER(name) = LOWER($1)
            ",
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;

        Ok(group)
    }

    /// True if a group name is already taken, optionally excluding one group.
    pub async fn name_exists(
        pool: &PgPool,
        name: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, DbError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM groups
            WHERE LOWER(name) = LOWER($1) AND ($2::text IS NULL OR id <> $2)
            ",
        )
        .bind(name)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;

        Ok(count > 0)
    }

    /// Persist the mutable fields, guarded by the revision the caller read.
    pub async fn persist(
        conn: &mut PgConnection,
        group: &Group,
        expected_revision: i64,
    ) -> Result<(), DbError> {
        ConcurrencyResolver::save("group", &group.id, || async move {
            sqlx::query(
                r"
                UPDATE groups
                SET name = $2, updated_at = $3, revision = revision + 1
                WHERE id = $1 AND revision = $4
                ",
            )
            .bind(&group.id)
            .bind(&group.name)
            .bind(group.updated_at)
            .bind(expected_revision)
            .execute(&mut *conn)
            .await
        })
        .await
    }

    /// Delete a group row inside an open transaction.
    pub async fn delete(conn: &mut PgConnection, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
