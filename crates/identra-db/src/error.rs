//! Error types for the identra-db crate.
//!
//! Wraps `SQLx` errors with transient/permanent classification so the retry
//! pipeline can distinguish a dropped connection from a business failure.

use identra_core::TransientClass;
use thiserror::Error;

use crate::transaction::TxState;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to establish or acquire a database connection.
    ///
    /// Indicates network issues, pool exhaustion, or the database server
    /// being unavailable. Retry-eligible.
    #[error("database connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// A query failed to execute.
    #[error("query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),

    /// A migration failed to apply.
    #[error("migration failed: {0}")]
    MigrationFailed(#[from] sqlx::migrate::MigrateError),

    /// A uniqueness constraint was violated at persist time.
    #[error("unique constraint violated: {constraint}")]
    UniqueViolation {
        /// Name of the violated constraint, as reported by the store.
        constraint: String,
    },

    /// The row's concurrency token no longer matched at persist time:
    /// another writer committed first. Surfaced, never auto-merged.
    #[error("concurrent update detected on {entity} '{id}'")]
    ConcurrencyConflict { entity: &'static str, id: String },

    /// An operation was attempted on a transaction coordinator in the
    /// wrong state (e.g. writing before `begin`, or after a terminal
    /// commit/rollback).
    #[error("transaction operation '{operation}' not permitted in state {state}")]
    TransactionState {
        operation: &'static str,
        state: TxState,
    },
}

impl DbError {
    /// True if this is a uniqueness violation.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }

    /// True if this is a concurrency conflict.
    #[must_use]
    pub fn is_concurrency_conflict(&self) -> bool {
        matches!(self, DbError::ConcurrencyConflict { .. })
    }
}

impl TransientClass for DbError {
    fn is_transient(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) if db.is_unique_violation() => DbError::UniqueViolation {
                constraint: db.constraint().unwrap_or("unknown").to_string(),
            },
            err @ (sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed) => DbError::ConnectionFailed(err),
            other => DbError::QueryFailed(other),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_failures_are_transient() {
        let err = DbError::from(sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());

        let err = DbError::from(sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        )));
        assert!(err.is_transient());
    }

    #[test]
    fn business_failures_are_permanent() {
        let err = DbError::UniqueViolation {
            constraint: "accounts_login_ci".to_string(),
        };
        assert!(err.is_permanent());
        assert!(err.is_unique_violation());

        let err = DbError::ConcurrencyConflict {
            entity: "account",
            id: "ACC123".to_string(),
        };
        assert!(err.is_permanent());
        assert!(err.is_concurrency_conflict());
    }

    #[test]
    fn query_failures_are_permanent() {
        let err = DbError::from(sqlx::Error::RowNotFound);
        assert!(err.is_permanent());
        assert!(matches!(err, DbError::QueryFailed(_)));
    }

    #[test]
    fn display_names_the_constraint() {
        let err = DbError::UniqueViolation {
            constraint: "groups_name_ci".to_string(),
        };
        assert!(err.to_string().contains("groups_name_ci"));
    }
}
