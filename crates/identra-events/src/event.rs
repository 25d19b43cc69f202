//! Event trait definition for type-safe event publishing.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be published as bus events.
///
/// Implementors define the topic and event type name; payloads are
/// serialized as JSON inside an envelope.
///
/// # Example
///
/// ```rust
/// use serde::{Serialize, Deserialize};
/// use identra_events::Event;
///
/// #[derive(Debug, Serialize, Deserialize)]
/// pub struct AccountArchived {
///     pub account_id: String,
/// }
///
/// impl Event for AccountArchived {
///     const TOPIC: &'static str = "identra.identity.account.archived";
///     const EVENT_TYPE: &'static str = "identra.identity.account.archived";
/// }
/// ```
pub trait Event: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// The bus topic for this event type.
    const TOPIC: &'static str;

    /// The fully qualified event type name.
    ///
    /// Convention: `identra.<area>.<entity>.<action>`
    const EVENT_TYPE: &'static str;
}
