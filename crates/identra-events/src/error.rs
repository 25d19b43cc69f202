//! Error types for the identra-events crate.

use identra_core::TransientClass;
use thiserror::Error;

/// Errors that can occur during event operations.
#[derive(Debug, Error)]
pub enum EventError {
    // Configuration errors (permanent, no retry)
    /// Required configuration variable is missing.
    #[error("configuration missing: {var}")]
    ConfigMissing { var: String },

    // Connection errors (transient, retry with backoff)
    /// Failed to connect to the bus broker.
    #[error("connection to broker {broker} failed: {cause}")]
    ConnectionFailed { broker: String, cause: String },

    /// Connection timed out.
    #[error("connection timed out")]
    ConnectionTimeout,

    // Publishing errors
    /// Failed to publish an event to a topic.
    #[error("failed to publish to topic {topic}: {cause}")]
    PublishFailed { topic: String, cause: String },

    /// Failed to serialize an event.
    #[error("failed to serialize event type {event_type}: {cause}")]
    SerializationFailed { event_type: String, cause: String },

    /// Failed to deserialize an event.
    #[error("failed to deserialize event type {event_type}: {raw}")]
    DeserializationFailed { event_type: String, raw: String },

    // Idempotence errors
    /// The consumed-message ledger could not be checked or updated.
    #[error("idempotence check failed: {cause}")]
    IdempotenceCheckFailed { cause: String },

    // Internal bus client errors
    /// Internal Kafka client error.
    #[cfg(feature = "kafka")]
    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    // Database errors
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl EventError {
    /// True if this error is transient and can be retried.
    pub fn is_retry_eligible(&self) -> bool {
        matches!(
            self,
            EventError::ConnectionFailed { .. }
                | EventError::ConnectionTimeout
                | EventError::PublishFailed { .. }
                | EventError::IdempotenceCheckFailed { .. }
        )
    }
}

impl TransientClass for EventError {
    fn is_transient(&self) -> bool {
        self.is_retry_eligible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_failures_are_transient() {
        let err = EventError::PublishFailed {
            topic: "identra.identity.account.upserted".to_string(),
            cause: "broker down".to_string(),
        };
        assert!(err.is_transient());

        assert!(EventError::ConnectionTimeout.is_transient());
    }

    #[test]
    fn config_and_serialization_failures_are_permanent() {
        let err = EventError::ConfigMissing {
            var: "KAFKA_BOOTSTRAP_SERVERS".to_string(),
        };
        assert!(err.is_permanent());

        let err = EventError::SerializationFailed {
            event_type: "identra.test".to_string(),
            cause: "bad".to_string(),
        };
        assert!(err.is_permanent());
    }

    #[test]
    fn display_names_the_variable() {
        let err = EventError::ConfigMissing {
            var: "KAFKA_BOOTSTRAP_SERVERS".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "configuration missing: KAFKA_BOOTSTRAP_SERVERS"
        );
    }
}
