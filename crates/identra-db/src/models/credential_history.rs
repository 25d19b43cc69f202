//! Credential history ledger.
//!
//! Append-only record of an account's password hashes. The current hash is
//! appended before a rotation is recorded, so the ledger always contains
//! the hash that was replaced.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::DbError;

/// One retired (or initial) credential hash.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CredentialHistoryEntry {
    pub id: Uuid,
    pub account_id: String,
    pub password_hash: String,
    pub recorded_at: DateTime<Utc>,
}

impl CredentialHistoryEntry {
    /// Append a hash to the account's history.
    pub async fn append(
        conn: &mut PgConnection,
        account_id: &str,
        password_hash: &str,
    ) -> Result<CredentialHistoryEntry, DbError> {
        let entry = sqlx::query_as(
            r"
            INSERT INTO credential_history (account_id, password_hash)
            VALUES ($1, $2)
            RETURNING *
            ",
        )
        .bind(account_id)
        .bind(password_hash)
        .fetch_one(&mut *conn)
        .await?;

        Ok(entry)
    }

    /// The account's history, newest first.
    pub async fn list_for(
        pool: &PgPool,
        account_id: &str,
    ) -> Result<Vec<CredentialHistoryEntry>, DbError> {
        let entries = sqlx::query_as(
            r"
            SELECT * FROM credential_history
            WHERE account_id = $1
            ORDER BY recorded_at DESC, id
            ",
        )
        .bind(account_id)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Number of recorded entries for an account.
    pub async fn count_for(pool: &PgPool, account_id: &str) -> Result<i64, DbError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM credential_history WHERE account_id = $1")
                .bind(account_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Remove the account's history (account deletion path).
    pub async fn remove_all_for(conn: &mut PgConnection, account_id: &str) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM credential_history WHERE account_id = $1")
            .bind(account_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected())
    }
}
