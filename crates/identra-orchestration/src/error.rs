//! Error taxonomy for the orchestration services.
//!
//! These are the stable categories the calling layer (e.g. an HTTP
//! controller) maps onward. Business failures surface before any
//! transaction opens and are never retried; transient store failures are
//! retried by the pipeline and surface here only after exhaustion.

use identra_core::{RetryError, TransientClass};
use identra_db::DbError;
use thiserror::Error;

/// Failure of an orchestrated use case.
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// A business rule or input constraint was violated.
    #[error("validation failed on '{field}': {message}")]
    Validation { field: String, message: String },

    /// A referenced entity or collaborator does not exist.
    #[error("{kind} not found: {key}='{value}'")]
    NotFound {
        kind: &'static str,
        key: &'static str,
        value: String,
    },

    /// A uniqueness rule was violated, either up front or at persist time.
    #[error("conflict: {resource} already exists")]
    Conflict { resource: String },

    /// The entity was modified by another writer since it was read.
    /// Callers retry with fresh data; nothing is auto-merged.
    #[error("concurrent update detected on {entity} '{id}'")]
    ConcurrencyConflict { entity: &'static str, id: String },

    /// The retry budget for transient store failures ran out.
    #[error("transient infrastructure failure after {attempts} attempts")]
    TransientInfrastructure {
        attempts: u32,
        #[source]
        source: Box<OrchestrationError>,
    },

    /// The directory keeper reported an explicit error; the store write
    /// was rolled back.
    #[error("directory synchronization failed: {message}")]
    DirectorySyncFailed { message: String },

    /// The directory keeper reported success but no change; the store
    /// write was rolled back.
    #[error("directory reported no change for '{name}'")]
    DirectorySyncNoChange { name: String },

    /// A store failure that is neither a conflict nor retry-eligible.
    #[error("store operation failed: {0}")]
    Store(#[source] DbError),

    /// Invariant breach inside the service itself.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl OrchestrationError {
    /// Stable category name for the calling layer.
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            OrchestrationError::Validation { .. } => "validation",
            OrchestrationError::NotFound { .. } => "not_found",
            OrchestrationError::Conflict { .. } => "conflict",
            OrchestrationError::ConcurrencyConflict { .. } => "concurrency_conflict",
            OrchestrationError::TransientInfrastructure { .. } => "transient_infrastructure",
            OrchestrationError::DirectorySyncFailed { .. }
            | OrchestrationError::DirectorySyncNoChange { .. } => "directory_sync_failure",
            OrchestrationError::Store(_) | OrchestrationError::Internal { .. } => {
                "operation_failed"
            }
        }
    }

    /// Fold a retry-pipeline result back into the taxonomy.
    #[must_use]
    pub fn from_retry(err: RetryError<OrchestrationError>) -> Self {
        match err {
            RetryError::Permanent(e) => e,
            RetryError::Exhausted { attempts, source } => {
                OrchestrationError::TransientInfrastructure {
                    attempts,
                    source: Box::new(source),
                }
            }
        }
    }

    /// Shorthand for a validation error.
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        OrchestrationError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl TransientClass for OrchestrationError {
    fn is_transient(&self) -> bool {
        matches!(self, OrchestrationError::Store(e) if e.is_transient())
    }
}

impl From<DbError> for OrchestrationError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { constraint } => OrchestrationError::Conflict {
                resource: constraint,
            },
            DbError::ConcurrencyConflict { entity, id } => {
                OrchestrationError::ConcurrencyConflict { entity, id }
            }
            other => OrchestrationError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_becomes_conflict() {
        let err = OrchestrationError::from(DbError::UniqueViolation {
            constraint: "accounts_login_ci".to_string(),
        });
        assert!(matches!(err, OrchestrationError::Conflict { .. }));
        assert_eq!(err.category(), "conflict");
    }

    #[test]
    fn concurrency_conflict_is_surfaced() {
        let err = OrchestrationError::from(DbError::ConcurrencyConflict {
            entity: "account",
            id: "ACC1".to_string(),
        });
        assert!(matches!(err, OrchestrationError::ConcurrencyConflict { .. }));
        assert!(err.is_permanent());
    }

    #[test]
    fn only_connection_level_store_errors_are_transient() {
        let transient = OrchestrationError::from(DbError::from(sqlx::Error::PoolTimedOut));
        assert!(transient.is_transient());

        let permanent = OrchestrationError::from(DbError::from(sqlx::Error::RowNotFound));
        assert!(permanent.is_permanent());

        assert!(OrchestrationError::validation("login", "required").is_permanent());
    }

    #[test]
    fn exhaustion_maps_to_transient_infrastructure() {
        let inner = OrchestrationError::from(DbError::from(sqlx::Error::PoolTimedOut));
        let err = OrchestrationError::from_retry(RetryError::Exhausted {
            attempts: 4,
            source: inner,
        });

        match &err {
            OrchestrationError::TransientInfrastructure { attempts, .. } => {
                assert_eq!(*attempts, 4);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(err.category(), "transient_infrastructure");
    }

    #[test]
    fn permanent_retry_errors_pass_through() {
        let err = OrchestrationError::from_retry(RetryError::Permanent(
            OrchestrationError::validation("name", "required"),
        ));
        assert!(matches!(err, OrchestrationError::Validation { .. }));
    }

    #[test]
    fn sync_failure_categories() {
        let explicit = OrchestrationError::DirectorySyncFailed {
            message: "TestError".to_string(),
        };
        let silent = OrchestrationError::DirectorySyncNoChange {
            name: "jane.doe".to_string(),
        };
        assert_eq!(explicit.category(), "directory_sync_failure");
        assert_eq!(silent.category(), "directory_sync_failure");
    }
}
