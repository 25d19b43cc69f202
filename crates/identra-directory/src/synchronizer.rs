//! Failure-contained synchronizer over the keeper transport.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::command::{EntityKind, RemoveCommand, SyncOutcome, UpsertCommand};
use crate::transport::DirectoryTransport;

/// Drives the keeper's upsert/remove calls and classifies their outcome.
///
/// The synchronizer never propagates a transport error: any failure is
/// captured into the outcome's error slot, so the caller always gets a
/// `SyncOutcome` it can turn into a commit/rollback decision.
///
/// The keeper's side effect is not transactional and not reversible from
/// here. Rolling back the primary store after an accepted keeper write
/// leaves a stale directory entry until the next successful sync of that
/// entity; the keeper call is likewise not cancellable mid-flight.
pub struct DirectorySynchronizer {
    transport: Arc<dyn DirectoryTransport>,
}

impl DirectorySynchronizer {
    /// Create a synchronizer over the given transport.
    #[must_use]
    pub fn new(transport: Arc<dyn DirectoryTransport>) -> Self {
        Self { transport }
    }

    /// Synchronize an entity into the keeper.
    ///
    /// Builds the fixed positional parameter set for `kind` and invokes
    /// the upsert call. `content` is the serialized entity record the
    /// keeper stores denormalized.
    pub async fn sync_upsert(
        &self,
        kind: EntityKind,
        login_or_name: &str,
        display_name: &str,
        expiry: Option<DateTime<Utc>>,
        content: String,
    ) -> SyncOutcome {
        let command = UpsertCommand {
            prefix_code: kind.prefix_code().to_string(),
            login_or_name: login_or_name.to_string(),
            display_name: display_name.to_string(),
            class_code: kind.class_code(),
            expiry,
            content,
            read_only: false,
        };

        match self.transport.upsert(&command).await {
            Ok(reply) => {
                let outcome = SyncOutcome::from_reply(reply);
                debug!(
                    name = %login_or_name,
                    changed = outcome.changed,
                    success = outcome.success,
                    "Directory upsert completed"
                );
                outcome
            }
            Err(e) => {
                warn!(name = %login_or_name, error = %e, "Directory upsert call failed");
                SyncOutcome::failure(e.to_string())
            }
        }
    }

    /// Remove an entity's entry from the keeper.
    pub async fn sync_remove(&self, login_or_name: &str) -> SyncOutcome {
        let command = RemoveCommand {
            login_or_name: login_or_name.to_string(),
        };

        match self.transport.remove(&command).await {
            Ok(reply) => {
                let outcome = SyncOutcome::from_reply(reply);
                debug!(
                    name = %login_or_name,
                    changed = outcome.changed,
                    "Directory remove completed"
                );
                outcome
            }
            Err(e) => {
                warn!(name = %login_or_name, error = %e, "Directory remove call failed");
                SyncOutcome::failure(e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::DirectoryReply;
    use crate::error::DirectoryError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Transport that records commands and replays a scripted response.
    struct ScriptedTransport {
        reply: Mutex<Option<Result<DirectoryReply, DirectoryError>>>,
        seen_upserts: Mutex<Vec<UpsertCommand>>,
        seen_removes: Mutex<Vec<RemoveCommand>>,
    }

    impl ScriptedTransport {
        fn new(reply: Result<DirectoryReply, DirectoryError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                seen_upserts: Mutex::new(Vec::new()),
                seen_removes: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl DirectoryTransport for ScriptedTransport {
        async fn upsert(&self, command: &UpsertCommand) -> Result<DirectoryReply, DirectoryError> {
            self.seen_upserts.lock().unwrap().push(command.clone());
            self.reply.lock().unwrap().take().expect("single call")
        }

        async fn remove(&self, command: &RemoveCommand) -> Result<DirectoryReply, DirectoryError> {
            self.seen_removes.lock().unwrap().push(command.clone());
            self.reply.lock().unwrap().take().expect("single call")
        }
    }

    fn ok_reply(changed: bool) -> DirectoryReply {
        DirectoryReply {
            generated_id: Some("DIR42".to_string()),
            generated_code: Some("c0ffee".to_string()),
            changed,
            error: None,
        }
    }

    #[tokio::test]
    async fn upsert_builds_positional_parameters() {
        let transport = ScriptedTransport::new(Ok(ok_reply(true)));
        let sync = DirectorySynchronizer::new(transport.clone());

        let outcome = sync
            .sync_upsert(
                EntityKind::Account,
                "jane.doe",
                "Jane Doe",
                None,
                "<account/>".to_string(),
            )
            .await;

        assert!(outcome.accepted());
        assert_eq!(outcome.generated_code.as_deref(), Some("c0ffee"));

        let seen = transport.seen_upserts.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].prefix_code, "ACC");
        assert_eq!(seen[0].class_code, 1);
        assert_eq!(seen[0].login_or_name, "jane.doe");
        assert_eq!(seen[0].content, "<account/>");
        assert!(!seen[0].read_only);
    }

    #[tokio::test]
    async fn group_upsert_uses_group_codes() {
        let transport = ScriptedTransport::new(Ok(ok_reply(true)));
        let sync = DirectorySynchronizer::new(transport.clone());

        sync.sync_upsert(EntityKind::Group, "auditors", "Auditors", None, String::new())
            .await;

        let seen = transport.seen_upserts.lock().unwrap();
        assert_eq!(seen[0].prefix_code, "GRP");
        assert_eq!(seen[0].class_code, 2);
    }

    #[tokio::test]
    async fn transport_error_is_contained() {
        let transport =
            ScriptedTransport::new(Err(DirectoryError::call_failed("keeper unreachable")));
        let sync = DirectorySynchronizer::new(transport);

        let outcome = sync
            .sync_upsert(EntityKind::Account, "jane", "Jane", None, String::new())
            .await;

        assert!(!outcome.success);
        assert!(!outcome.changed);
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .contains("keeper unreachable"));
    }

    #[tokio::test]
    async fn explicit_keeper_error_is_surfaced_in_outcome() {
        let transport = ScriptedTransport::new(Ok(DirectoryReply {
            changed: false,
            error: Some("TestError".to_string()),
            ..Default::default()
        }));
        let sync = DirectorySynchronizer::new(transport);

        let outcome = sync
            .sync_upsert(EntityKind::Account, "jane", "Jane", None, String::new())
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("TestError"));
    }

    #[tokio::test]
    async fn unchanged_reply_is_success_but_not_accepted() {
        let transport = ScriptedTransport::new(Ok(ok_reply(false)));
        let sync = DirectorySynchronizer::new(transport);

        let outcome = sync
            .sync_upsert(EntityKind::Account, "jane", "Jane", None, String::new())
            .await;

        assert!(outcome.success);
        assert!(!outcome.changed);
        assert!(!outcome.accepted());
    }

    #[tokio::test]
    async fn remove_addresses_entry_by_name() {
        let transport = ScriptedTransport::new(Ok(DirectoryReply {
            changed: true,
            ..Default::default()
        }));
        let sync = DirectorySynchronizer::new(transport.clone());

        let outcome = sync.sync_remove("jane.doe").await;
        assert!(outcome.accepted());

        let seen = transport.seen_removes.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].login_or_name, "jane.doe");
    }

    #[tokio::test]
    async fn remove_error_is_contained() {
        let transport = ScriptedTransport::new(Err(DirectoryError::call_failed("timeout")));
        let sync = DirectorySynchronizer::new(transport);

        let outcome = sync.sync_remove("jane.doe").await;
        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("timeout"));
    }
}
