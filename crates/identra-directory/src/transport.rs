//! Transport boundary for the legacy keeper call.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::command::{DirectoryReply, RemoveCommand, UpsertCommand};
use crate::error::{DirectoryError, DirectoryResult};

/// The stored-procedure-like call into the legacy directory keeper.
///
/// Implementations perform the raw invocation and surface transport
/// failures as errors; outcome interpretation stays with the
/// synchronizer. Tests substitute scripted implementations.
#[async_trait]
pub trait DirectoryTransport: Send + Sync {
    /// Invoke the keeper's upsert procedure.
    async fn upsert(&self, command: &UpsertCommand) -> DirectoryResult<DirectoryReply>;

    /// Invoke the keeper's remove procedure.
    async fn remove(&self, command: &RemoveCommand) -> DirectoryResult<DirectoryReply>;
}

/// Transport over the keeper's own database.
///
/// The keeper exposes `directory_keeper_sync` and `directory_keeper_remove`
/// functions in its schema; this transport invokes them through a pool
/// dedicated to the keeper, never the primary store's pool: the two
/// systems share no transaction.
pub struct PgDirectoryTransport {
    pool: PgPool,
}

impl PgDirectoryTransport {
    /// Create a transport over the keeper's pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryTransport for PgDirectoryTransport {
    async fn upsert(&self, command: &UpsertCommand) -> DirectoryResult<DirectoryReply> {
        let row: (Option<String>, Option<String>, bool, Option<String>) = sqlx::query_as(
            r"
            SELECT generated_id, generated_code, changed, error
            FROM directory_keeper_sync($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&command.prefix_code)
        .bind(&command.login_or_name)
        .bind(&command.display_name)
        .bind(command.class_code)
        .bind(command.expiry)
        .bind(&command.content)
        .bind(command.read_only)
        .fetch_one(&self.pool)
        .await?;

        Ok(DirectoryReply {
            generated_id: row.0,
            generated_code: row.1,
            changed: row.2,
            error: row.3,
        })
    }

    async fn remove(&self, command: &RemoveCommand) -> DirectoryResult<DirectoryReply> {
        // id and class slots stay vacant on removes
        let changed: bool = sqlx::query_scalar(
            r"
            SELECT changed FROM directory_keeper_remove($1, $2, $3)
            ",
        )
        .bind(Option::<String>::None)
        .bind(&command.login_or_name)
        .bind(Option::<i32>::None)
        .fetch_one(&self.pool)
        .await
        .map_err(DirectoryError::from)?;

        Ok(DirectoryReply {
            changed,
            ..Default::default()
        })
    }
}
