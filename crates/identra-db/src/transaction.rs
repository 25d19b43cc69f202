//! Transaction coordinator for orchestrated writes.
//!
//! The coordinator stages primary-store writes inside an open transaction
//! and exposes a single combined decision point, [`TransactionCoordinator::
//! define`], that either commits or discards everything. The deciding
//! signal (the directory call's outcome) is only known after the store
//! write has already been staged, which is why there is no separate
//! "persist" step.
//!
//! Each coordinator instance is exclusively owned by one in-flight
//! orchestration call and is never reused after reaching a terminal state.

use sqlx::postgres::PgConnection;
use sqlx::{PgPool, Postgres, Transaction};
use std::fmt::{Display, Formatter};
use tracing::debug;

use crate::error::DbError;

/// Coordinator life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// No transaction opened yet.
    Idle,
    /// A store transaction is open; writes are staged but not durable.
    InTransaction,
    /// Terminal: staged writes were persisted.
    Committed,
    /// Terminal: staged writes were discarded.
    RolledBack,
}

impl TxState {
    /// True once the coordinator reached Committed or RolledBack.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxState::Committed | TxState::RolledBack)
    }
}

impl Display for TxState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TxState::Idle => write!(f, "idle"),
            TxState::InTransaction => write!(f, "in_transaction"),
            TxState::Committed => write!(f, "committed"),
            TxState::RolledBack => write!(f, "rolled_back"),
        }
    }
}

/// Explicit begin/define wrapper around a pooled store transaction.
///
/// State machine: `Idle → InTransaction → {Committed, RolledBack}`.
/// Operations outside the legal state fail with
/// [`DbError::TransactionState`]; terminal states accept no further
/// operations.
pub struct TransactionCoordinator {
    pool: PgPool,
    state: TxState,
    tx: Option<Transaction<'static, Postgres>>,
}

impl TransactionCoordinator {
    /// Create an idle coordinator over the given pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            state: TxState::Idle,
            tx: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TxState {
        self.state
    }

    /// Open the store transaction: `Idle → InTransaction`.
    ///
    /// # Errors
    ///
    /// `DbError::TransactionState` if the coordinator is not idle;
    /// `DbError::ConnectionFailed` if no connection could be acquired.
    pub async fn begin(&mut self) -> Result<(), DbError> {
        if self.state != TxState::Idle {
            return Err(DbError::TransactionState {
                operation: "begin",
                state: self.state,
            });
        }
        self.tx = Some(self.pool.begin().await?);
        self.state = TxState::InTransaction;
        Ok(())
    }

    /// The open transaction's connection, for staging writes.
    ///
    /// # Errors
    ///
    /// `DbError::TransactionState` unless the coordinator is in
    /// `InTransaction`.
    pub fn executor(&mut self) -> Result<&mut PgConnection, DbError> {
        match self.tx.as_deref_mut() {
            Some(conn) => Ok(conn),
            None => Err(DbError::TransactionState {
                operation: "executor",
                state: self.state,
            }),
        }
    }

    /// The single exit: commit staged writes when `outcome` is true,
    /// discard them otherwise. Returns the terminal state reached.
    ///
    /// # Errors
    ///
    /// `DbError::TransactionState` unless the coordinator is in
    /// `InTransaction`; store errors from the commit/rollback itself.
    pub async fn define(&mut self, outcome: bool) -> Result<TxState, DbError> {
        let tx = self.tx.take().ok_or(DbError::TransactionState {
            operation: "define",
            state: self.state,
        })?;

        if outcome {
            tx.commit().await?;
            self.state = TxState::Committed;
        } else {
            tx.rollback().await?;
            self.state = TxState::RolledBack;
        }
        debug!(state = %self.state, "Transaction defined");
        Ok(self.state)
    }
}

impl std::fmt::Debug for TransactionCoordinator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionCoordinator")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_pool() -> PgPool {
        // connect_lazy performs no I/O; good enough for state-guard tests
        PgPool::connect_lazy("postgres://identra@localhost/identra_test")
            .expect("lazy pool options are valid")
    }

    #[tokio::test]
    async fn starts_idle() {
        let coordinator = TransactionCoordinator::new(lazy_pool());
        assert_eq!(coordinator.state(), TxState::Idle);
        assert!(!coordinator.state().is_terminal());
    }

    #[tokio::test]
    async fn executor_requires_open_transaction() {
        let mut coordinator = TransactionCoordinator::new(lazy_pool());
        let err = coordinator.executor().unwrap_err();
        assert!(matches!(
            err,
            DbError::TransactionState {
                operation: "executor",
                state: TxState::Idle,
            }
        ));
    }

    #[tokio::test]
    async fn define_requires_open_transaction() {
        let mut coordinator = TransactionCoordinator::new(lazy_pool());
        let err = coordinator.define(true).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::TransactionState {
                operation: "define",
                state: TxState::Idle,
            }
        ));
    }

    #[test]
    fn terminal_states() {
        assert!(TxState::Committed.is_terminal());
        assert!(TxState::RolledBack.is_terminal());
        assert!(!TxState::Idle.is_terminal());
        assert!(!TxState::InTransaction.is_terminal());
    }

    #[test]
    fn state_display() {
        assert_eq!(TxState::InTransaction.to_string(), "in_transaction");
        assert_eq!(TxState::RolledBack.to_string(), "rolled_back");
    }
}
