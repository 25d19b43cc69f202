//! Event envelope wrapping all events with metadata.

use crate::error::EventError;
use crate::event::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard envelope wrapping every identra event.
///
/// Carries the metadata consumers need for routing, idempotence checks,
/// and audit: the event id is the dedup key against the consumed-message
/// ledger, and `actor_id` identifies the requesting actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Unique identifier for this event instance.
    pub event_id: Uuid,

    /// Fully qualified event type name, e.g.
    /// `identra.identity.account.upserted`.
    pub event_type: String,

    /// Tenant context.
    pub tenant_id: Uuid,

    /// Requesting actor; None for system-generated events.
    pub actor_id: Option<Uuid>,

    /// When the event was created.
    pub timestamp: DateTime<Utc>,

    /// The event payload.
    pub payload: T,
}

impl<T: Event> EventEnvelope<T> {
    /// Create a new envelope around a payload.
    pub fn new(payload: T, tenant_id: Uuid, actor_id: Option<Uuid>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            event_type: T::EVENT_TYPE.to_string(),
            tenant_id,
            actor_id,
            timestamp: Utc::now(),
            payload,
        }
    }

    /// The bus topic for this envelope.
    pub fn topic(&self) -> &'static str {
        T::TOPIC
    }

    /// Partition key: the tenant id, so a tenant's events stay ordered.
    pub fn partition_key(&self) -> String {
        self.tenant_id.to_string()
    }

    /// Serialize the envelope to JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, EventError>
    where
        T: Serialize,
    {
        serde_json::to_vec(self).map_err(|e| EventError::SerializationFailed {
            event_type: T::EVENT_TYPE.to_string(),
            cause: e.to_string(),
        })
    }

    /// Deserialize an envelope from JSON bytes.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, EventError>
    where
        T: for<'de> Deserialize<'de>,
    {
        serde_json::from_slice(bytes).map_err(|_| EventError::DeserializationFailed {
            event_type: T::EVENT_TYPE.to_string(),
            raw: String::from_utf8_lossy(bytes).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestEvent {
        message: String,
    }

    impl Event for TestEvent {
        const TOPIC: &'static str = "identra.test.event";
        const EVENT_TYPE: &'static str = "identra.test.event";
    }

    #[test]
    fn envelope_carries_metadata() {
        let tenant_id = Uuid::new_v4();
        let actor_id = Some(Uuid::new_v4());
        let event = TestEvent {
            message: "hello".to_string(),
        };

        let envelope = EventEnvelope::new(event, tenant_id, actor_id);

        assert_eq!(envelope.event_type, "identra.test.event");
        assert_eq!(envelope.tenant_id, tenant_id);
        assert_eq!(envelope.actor_id, actor_id);
        assert_eq!(envelope.topic(), "identra.test.event");
    }

    #[test]
    fn serialization_round_trip() {
        let envelope = EventEnvelope::new(
            TestEvent {
                message: "roundtrip".to_string(),
            },
            Uuid::new_v4(),
            None,
        );

        let bytes = envelope.to_json_bytes().unwrap();
        let restored: EventEnvelope<TestEvent> = EventEnvelope::from_json_bytes(&bytes).unwrap();

        assert_eq!(restored.event_id, envelope.event_id);
        assert_eq!(restored.payload, envelope.payload);
    }

    #[test]
    fn partition_key_is_tenant_id() {
        let tenant_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let envelope = EventEnvelope::new(
            TestEvent {
                message: String::new(),
            },
            tenant_id,
            None,
        );

        assert_eq!(
            envelope.partition_key(),
            "550e8400-e29b-41d4-a716-446655440000"
        );
    }
}
