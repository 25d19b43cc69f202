//! Idempotence ledger for at-least-once consumers.
//!
//! The bus delivers at least once; consumers deduplicate against the
//! consumed-message ledger, keyed by event id and consumer group, using
//! the store's unique constraint.

use crate::error::EventError;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Service for marking and checking consumed messages.
pub struct IdempotenceService {
    pool: PgPool,
    consumer_group: String,
}

impl IdempotenceService {
    /// Create a new idempotence service for a consumer group.
    pub fn new(pool: PgPool, consumer_group: impl Into<String>) -> Self {
        Self {
            pool,
            consumer_group: consumer_group.into(),
        }
    }

    /// Check whether an event has already been processed.
    #[instrument(skip(self), fields(consumer_group = %self.consumer_group))]
    pub async fn is_processed(&self, event_id: Uuid) -> Result<bool, EventError> {
        let row: (bool,) = sqlx::query_as(
            r"
            SELECT EXISTS(
                SELECT 1 FROM consumed_messages
                WHERE event_id = $1 AND consumer_group = $2
            )
            ",
        )
        .bind(event_id)
        .bind(&self.consumer_group)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| EventError::IdempotenceCheckFailed {
            cause: e.to_string(),
        })?;

        debug!(event_id = %event_id, already_processed = row.0, "Idempotence check");

        Ok(row.0)
    }

    /// Try to mark an event as processed.
    ///
    /// Returns true if this call won the marker (first to process),
    /// false if the event was already marked by this consumer group.
    #[instrument(skip(self), fields(consumer_group = %self.consumer_group))]
    pub async fn try_mark_processed(
        &self,
        event_id: Uuid,
        topic: &str,
    ) -> Result<bool, EventError> {
        let result = sqlx::query(
            r"
            INSERT INTO consumed_messages (event_id, consumer_group, topic)
            VALUES ($1, $2, $3)
            ON CONFLICT (event_id, consumer_group) DO NOTHING
            ",
        )
        .bind(event_id)
        .bind(&self.consumer_group)
        .bind(topic)
        .execute(&self.pool)
        .await
        .map_err(|e| EventError::IdempotenceCheckFailed {
            cause: e.to_string(),
        })?;

        let marked = result.rows_affected() > 0;

        debug!(
            event_id = %event_id,
            topic = %topic,
            marked_as_processed = marked,
            "Idempotence mark"
        );

        Ok(marked)
    }

    /// The consumer group name.
    #[must_use]
    pub fn consumer_group(&self) -> &str {
        &self.consumer_group
    }
}
