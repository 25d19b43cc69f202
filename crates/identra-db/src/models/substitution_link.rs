//! Substitution links.
//!
//! Directed self-referential join: an account may name other accounts as
//! its substitutes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgConnection;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::DbError;

/// A substitute relationship: `account_id` names `substitute_id`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SubstitutionLink {
    pub id: Uuid,
    pub account_id: String,
    pub substitute_id: String,
    pub created_at: DateTime<Utc>,
}

impl SubstitutionLink {
    /// Add a substitute. Returns false if the link already exists.
    pub async fn add(
        conn: &mut PgConnection,
        account_id: &str,
        substitute_id: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            INSERT INTO substitution_links (account_id, substitute_id)
            VALUES ($1, $2)
            ON CONFLICT (account_id, substitute_id) DO NOTHING
            ",
        )
        .bind(account_id)
        .bind(substitute_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a substitute. Returns false if no such link existed.
    pub async fn remove(
        conn: &mut PgConnection,
        account_id: &str,
        substitute_id: &str,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            DELETE FROM substitution_links
            WHERE account_id = $1 AND substitute_id = $2
            ",
        )
        .bind(account_id)
        .bind(substitute_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Substitute account ids named by an account, ordered.
    pub async fn substitutes_for(pool: &PgPool, account_id: &str) -> Result<Vec<String>, DbError> {
        let ids: Vec<String> = sqlx::query_scalar(
            r"
            SELECT substitute_id FROM substitution_links
            WHERE account_id = $1
            ORDER BY substitute_id
            ",
        )
        .bind(account_id)
        .fetch_all(pool)
        .await?;

        Ok(ids)
    }

    /// Remove every link referencing the account, in either direction
    /// (account deletion path).
    pub async fn remove_all_referencing(
        conn: &mut PgConnection,
        account_id: &str,
    ) -> Result<u64, DbError> {
        let result = sqlx::query(
            r"
            DELETE FROM substitution_links
            WHERE account_id = $1 OR substitute_id = $1
            ",
        )
        .bind(account_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }
}
