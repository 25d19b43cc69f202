//! # identra-events
//!
//! Event bus library for identra.
//!
//! Provides typed identity events, the envelope that wraps them, the
//! Kafka producer, an object-safe sink boundary for the orchestration
//! services, and the consumed-message idempotence ledger.
//!
//! ## Cargo Features
//!
//! - `kafka`: enable the Kafka producer (requires librdkafka)
//!
//! ## Example
//!
//! ```rust,ignore
//! use identra_events::{EventProducer, KafkaConfig};
//! use identra_events::events::AccountDeleted;
//!
//! let config = KafkaConfig::from_env()?;
//! let producer = EventProducer::new(&config)?;
//!
//! producer
//!     .publish_event(
//!         AccountDeleted { account_id: "ACC1".to_string() },
//!         tenant_id,
//!         Some(actor_id),
//!     )
//!     .await?;
//! ```

// Core modules (always available)
pub mod envelope;
pub mod error;
pub mod event;
pub mod events;
pub mod idempotence;
pub mod projection;
pub mod sink;

// Kafka-dependent modules (require `kafka` feature)
#[cfg(feature = "kafka")]
pub mod config;
#[cfg(feature = "kafka")]
pub mod producer;

pub use envelope::EventEnvelope;
pub use error::EventError;
pub use event::Event;
pub use idempotence::IdempotenceService;
pub use projection::{AccountProjection, GrantProjection, GroupProjection};
pub use sink::{EventSink, IdentityEvent};

#[cfg(feature = "kafka")]
pub use config::KafkaConfig;
#[cfg(feature = "kafka")]
pub use producer::EventProducer;
