//! Optimistic concurrency resolver.
//!
//! Every mutable row carries a `revision` column that is incremented on
//! each committed update. Guarded persist statements include
//! `AND revision = $expected` in their predicate; when another writer got
//! there first the statement affects zero rows and the resolver surfaces a
//! [`DbError::ConcurrencyConflict`]. The resolver never re-fetches and
//! re-applies; resolving a conflict stays with the caller, who retries
//! with fresh data.
//!
//! Inside a coordinator-owned transaction the statement is only staged;
//! durability is deferred to the coordinator's decision point.

use sqlx::postgres::PgQueryResult;
use std::future::Future;

use crate::error::DbError;

/// Wraps revision-guarded persist calls.
pub struct ConcurrencyResolver;

impl ConcurrencyResolver {
    /// Execute a guarded persist statement and verify it took effect.
    ///
    /// `persist` must run an UPDATE/DELETE whose predicate includes the
    /// expected revision. Zero affected rows means the row was changed
    /// (or removed) by a concurrent writer since it was read.
    ///
    /// # Errors
    ///
    /// `DbError::ConcurrencyConflict` when the guard did not match;
    /// otherwise the mapped store error.
    pub async fn save<F, Fut>(entity: &'static str, id: &str, persist: F) -> Result<(), DbError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PgQueryResult, sqlx::Error>>,
    {
        let result = persist().await?;
        if result.rows_affected() == 0 {
            return Err(DbError::ConcurrencyConflict {
                entity,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
