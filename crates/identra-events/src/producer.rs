//! Kafka event producer.

use crate::config::KafkaConfig;
use crate::envelope::EventEnvelope;
use crate::error::EventError;
use crate::event::Event;
use crate::sink::{EventSink, IdentityEvent};

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use std::time::Duration;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Kafka event producer for publishing identity events.
pub struct EventProducer {
    producer: FutureProducer,
}

impl EventProducer {
    /// Create a new event producer with the given configuration.
    ///
    /// Connection is lazy; the first publish establishes it.
    pub fn new(config: &KafkaConfig) -> Result<Self, EventError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.bootstrap_servers)
            .set("client.id", &config.client_id)
            .set("message.timeout.ms", "5000")
            .set("acks", "all")
            .create()
            .map_err(|e| EventError::ConnectionFailed {
                broker: config.bootstrap_servers.clone(),
                cause: e.to_string(),
            })?;

        info!(
            bootstrap_servers = %config.bootstrap_servers,
            client_id = %config.client_id,
            "Event producer created"
        );

        Ok(Self { producer })
    }

    /// Publish an event wrapped in a fresh envelope.
    #[instrument(skip(self, event), fields(event_type = %E::EVENT_TYPE, tenant_id = %tenant_id))]
    pub async fn publish_event<E: Event>(
        &self,
        event: E,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> Result<(), EventError> {
        let envelope = EventEnvelope::new(event, tenant_id, actor_id);
        self.publish_envelope(envelope).await
    }

    /// Publish a pre-constructed envelope.
    #[instrument(skip(self, envelope), fields(
        event_id = %envelope.event_id,
        event_type = %envelope.event_type,
        tenant_id = %envelope.tenant_id
    ))]
    pub async fn publish_envelope<E: Event>(
        &self,
        envelope: EventEnvelope<E>,
    ) -> Result<(), EventError> {
        let topic = E::TOPIC;
        let key = envelope.partition_key();
        let payload = envelope.to_json_bytes()?;

        let record = FutureRecord::to(topic).key(&key).payload(&payload);

        let (partition, offset) = self
            .producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(err, _)| EventError::PublishFailed {
                topic: topic.to_string(),
                cause: err.to_string(),
            })?;

        debug!(partition, offset, "Event published");

        Ok(())
    }
}

#[async_trait]
impl EventSink for EventProducer {
    async fn publish(
        &self,
        event: IdentityEvent,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> Result<(), EventError> {
        match event {
            IdentityEvent::AccountUpserted(e) => self.publish_event(e, tenant_id, actor_id).await,
            IdentityEvent::AccountDeleted(e) => self.publish_event(e, tenant_id, actor_id).await,
            IdentityEvent::GroupUpserted(e) => self.publish_event(e, tenant_id, actor_id).await,
            IdentityEvent::GroupDeleted(e) => self.publish_event(e, tenant_id, actor_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn producer_creation_is_lazy() {
        let config = KafkaConfig {
            bootstrap_servers: "localhost:9092".to_string(),
            client_id: "test".to_string(),
        };

        // Creating the producer does not connect
        assert!(EventProducer::new(&config).is_ok());
    }
}
