//! Account entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::concurrency::ConcurrencyResolver;
use crate::error::DbError;

/// An account row in the primary store.
///
/// `login` is stored lowercase; uniqueness is enforced case-insensitively.
/// `revision` is the optimistic concurrency token: every committed update
/// increments it, and guarded persists predicate on the value the caller
/// read.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub tenant_id: Uuid,
    pub login: String,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    /// Authentication-mode tag, see `identra_core::AuthMode`.
    pub auth_mode: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i64,
}

/// Fields required to insert a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: String,
    pub tenant_id: Uuid,
    pub login: String,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub auth_mode: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Insert a new account inside an open transaction.
    ///
    /// The login is normalized to lowercase before insert. A concurrent
    /// insert of the same login surfaces as `DbError::UniqueViolation`.
    pub async fn insert(conn: &mut PgConnection, new: &NewAccount) -> Result<Account, DbError> {
        let account = sqlx::query_as(
            r"
            INSERT INTO accounts
                (id, tenant_id, login, display_name, email, phone,
                 password_hash, auth_mode, expires_at)
            VALUES ($1, $2, LOWER($3), $4, $5, $6, $7, $8, $9)
            RETURNING *
            ",
        )
        .bind(&new.id)
        .bind(new.tenant_id)
        .bind(&new.login)
        .bind(&new.display_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.password_hash)
        .bind(&new.auth_mode)
        .bind(new.expires_at)
        .fetch_one(&mut *conn)
        .await?;

        Ok(account)
    }

    /// Look up an account by id within a tenant.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: Uuid,
        id: &str,
    ) -> Result<Option<Account>, DbError> {
        let account = sqlx::query_as(
            r"
            SELECT * FROM accounts
            WHERE id = $1 AND tenant_id = $2
            ",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }

    /// Look up an account by login, case-insensitively, across tenants.
    /// Logins are globally unique.
    pub async fn find_by_login(pool: &PgPool, login: &str) -> Result<Option<Account>, DbError> {
        let account = sqlx::query_as(
            r"
            SELECT * FROM accounts
            WHERE login = LOWER($1)
            ",
        )
        .bind(login)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }

    /// True if a login is already taken, optionally excluding one account.
    pub async fn login_exists(
        pool: &PgPool,
        login: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, DbError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*) FROM accounts
            WHERE login = LOWER($1) AND ($2::text IS NULL OR id <> $2)
            ",
        )
        .bind(login)
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;

        Ok(count > 0)
    }

    /// Persist the mutable fields of an account, guarded by the revision
    /// the caller read.
    ///
    /// `account.updated_at` must already hold the new timestamp; the
    /// stored revision becomes `expected_revision + 1` on success.
    pub async fn persist(
        conn: &mut PgConnection,
        account: &Account,
        expected_revision: i64,
    ) -> Result<(), DbError> {
        ConcurrencyResolver::save("account", &account.id, || async move {
            sqlx::query(
                r"
                UPDATE accounts
                SET login = LOWER($2), display_name = $3, email = $4, phone = $5,
                    password_hash = $6, auth_mode = $7, is_active = $8,
                    expires_at = $9, updated_at = $10, revision = revision + 1
                WHERE id = $1 AND revision = $11
                ",
            )
            .bind(&account.id)
            .bind(&account.login)
            .bind(&account.display_name)
            .bind(&account.email)
            .bind(&account.phone)
            .bind(&account.password_hash)
            .bind(&account.auth_mode)
            .bind(account.is_active)
            .bind(account.expires_at)
            .bind(account.updated_at)
            .bind(expected_revision)
            .execute(&mut *conn)
            .await
        })
        .await
    }

    /// Bump `updated_at` and the revision without changing fields, guarded.
    /// Used when a relationship owned by the account changes.
    pub async fn touch(
        conn: &mut PgConnection,
        id: &str,
        expected_revision: i64,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        ConcurrencyResolver::save("account", id, || async move {
            sqlx::query(
                r"
                UPDATE accounts
                SET updated_at = $2, revision = revision + 1
                WHERE id = $1 AND revision = $3
                ",
            )
            .bind(id)
            .bind(now)
            .bind(expected_revision)
            .execute(&mut *conn)
            .await
        })
        .await
    }

    /// Delete an account row inside an open transaction.
    pub async fn delete(conn: &mut PgConnection, id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
