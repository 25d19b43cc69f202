//! Post-commit event publication.

use identra_core::RetryPipeline;
use identra_directory::SyncOutcome;
use identra_events::{EventSink, IdentityEvent};
use tracing::error;
use uuid::Uuid;

use crate::error::OrchestrationError;

/// Publish an event for a committed write through the publish pipeline.
///
/// The publication has its own retry budget. If it is still failing after
/// exhaustion, the committed store outcome stands: the failure is logged
/// loudly and not surfaced to the caller, because returning an error here
/// would misreport a durable write.
pub(crate) async fn publish_after_commit(
    pipeline: &RetryPipeline,
    sink: &dyn EventSink,
    event: IdentityEvent,
    tenant_id: Uuid,
    actor_id: Option<Uuid>,
) {
    let event_type = event.event_type();
    if let Err(e) = pipeline
        .execute(|| sink.publish(event.clone(), tenant_id, actor_id))
        .await
    {
        error!(
            event_type,
            tenant_id = %tenant_id,
            error = %e,
            "Event publication failed after committed write"
        );
    }
}

/// Map a rejected sync outcome onto the error taxonomy, distinguishing an
/// explicit keeper error from a silent no-change.
pub(crate) fn sync_failure(outcome: &SyncOutcome, name: &str) -> OrchestrationError {
    match &outcome.error {
        Some(message) => OrchestrationError::DirectorySyncFailed {
            message: message.clone(),
        },
        None => OrchestrationError::DirectorySyncNoChange {
            name: name.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_error_beats_no_change() {
        let outcome = SyncOutcome::failure("TestError");
        let err = sync_failure(&outcome, "jane.doe");
        assert!(matches!(
            err,
            OrchestrationError::DirectorySyncFailed { message } if message == "TestError"
        ));
    }

    #[test]
    fn silent_no_change_is_its_own_case() {
        let outcome = SyncOutcome {
            changed: false,
            success: true,
            error: None,
            generated_code: None,
        };
        let err = sync_failure(&outcome, "jane.doe");
        assert!(matches!(
            err,
            OrchestrationError::DirectorySyncNoChange { name } if name == "jane.doe"
        ));
    }
}
