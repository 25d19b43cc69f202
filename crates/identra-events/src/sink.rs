//! Object-safe publication boundary.
//!
//! The orchestration services publish through a `dyn EventSink`, so tests
//! substitute recording or failing sinks without a broker. The closed
//! [`IdentityEvent`] set keeps the trait object-safe where the producer's
//! generic `publish` is not.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::EventError;
use crate::events::{AccountDeleted, AccountUpserted, GroupDeleted, GroupUpserted};
use crate::event::Event;

/// The identity domain's event set.
#[derive(Debug, Clone)]
pub enum IdentityEvent {
    AccountUpserted(AccountUpserted),
    AccountDeleted(AccountDeleted),
    GroupUpserted(GroupUpserted),
    GroupDeleted(GroupDeleted),
}

impl IdentityEvent {
    /// The fully qualified event type name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            IdentityEvent::AccountUpserted(_) => AccountUpserted::EVENT_TYPE,
            IdentityEvent::AccountDeleted(_) => AccountDeleted::EVENT_TYPE,
            IdentityEvent::GroupUpserted(_) => GroupUpserted::EVENT_TYPE,
            IdentityEvent::GroupDeleted(_) => GroupDeleted::EVENT_TYPE,
        }
    }
}

/// A publish handle for identity events.
///
/// Shared and thread-safe; one instance serves all concurrent
/// orchestration calls.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish one event in the given tenant/actor context.
    async fn publish(
        &self,
        event: IdentityEvent,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> Result<(), EventError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_matches_payload() {
        let event = IdentityEvent::AccountDeleted(AccountDeleted {
            account_id: "ACC1".to_string(),
        });
        assert_eq!(event.event_type(), "identra.identity.account.deleted");

        let event = IdentityEvent::GroupDeleted(GroupDeleted {
            group_id: "GRP1".to_string(),
        });
        assert_eq!(event.event_type(), "identra.identity.group.deleted");
    }
}
