//! The keeper's positional call contract.
//!
//! The legacy directory keeper is driven by a stored-procedure-like call
//! with a fixed positional parameter set and output slots. These types
//! model that contract verbatim; the synchronizer builds them and derives
//! the structured outcome from the reply.

use chrono::{DateTime, Utc};

/// Which kind of entity a directory entry describes.
///
/// The keeper distinguishes entries by a numeric class code and prefixes
/// generated identifiers with a per-kind code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Account,
    Group,
}

impl EntityKind {
    /// The keeper's numeric class code for this kind.
    #[must_use]
    pub fn class_code(&self) -> i32 {
        match self {
            EntityKind::Account => 1,
            EntityKind::Group => 2,
        }
    }

    /// The keeper's id prefix code for this kind.
    #[must_use]
    pub fn prefix_code(&self) -> &'static str {
        match self {
            EntityKind::Account => "ACC",
            EntityKind::Group => "GRP",
        }
    }
}

/// Upsert call, positional order fixed by the keeper.
#[derive(Debug, Clone)]
pub struct UpsertCommand {
    pub prefix_code: String,
    pub login_or_name: String,
    pub display_name: String,
    pub class_code: i32,
    pub expiry: Option<DateTime<Utc>>,
    /// Serialized entity record the keeper stores denormalized.
    pub content: String,
    pub read_only: bool,
}

/// Remove call. The keeper's id and class slots stay vacant; the entry is
/// addressed by login or name.
#[derive(Debug, Clone)]
pub struct RemoveCommand {
    pub login_or_name: String,
}

/// The keeper's output slots.
#[derive(Debug, Clone, Default)]
pub struct DirectoryReply {
    pub generated_id: Option<String>,
    pub generated_code: Option<String>,
    pub changed: bool,
    /// Empty on success.
    pub error: Option<String>,
}

/// Structured outcome of a synchronization attempt.
///
/// `success` is derived from the reply's error slot being empty; `changed`
/// is the keeper's changed flag. The orchestration commits its staged
/// store write only when both hold.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub changed: bool,
    pub success: bool,
    pub error: Option<String>,
    /// The keeper's generated entry code, carried into events as the
    /// directory sync hash.
    pub generated_code: Option<String>,
}

impl SyncOutcome {
    /// Derive the outcome from a keeper reply.
    #[must_use]
    pub fn from_reply(reply: DirectoryReply) -> Self {
        let error = reply.error.filter(|e| !e.is_empty());
        SyncOutcome {
            changed: reply.changed,
            success: error.is_none(),
            error,
            generated_code: reply.generated_code,
        }
    }

    /// Outcome for a contained transport failure.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        SyncOutcome {
            changed: false,
            success: false,
            error: Some(message.into()),
            generated_code: None,
        }
    }

    /// True when the keeper both succeeded and recorded a change, the
    /// condition under which the orchestration commits.
    #[must_use]
    pub fn accepted(&self) -> bool {
        self.success && self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes() {
        assert_eq!(EntityKind::Account.class_code(), 1);
        assert_eq!(EntityKind::Group.class_code(), 2);
        assert_eq!(EntityKind::Account.prefix_code(), "ACC");
        assert_eq!(EntityKind::Group.prefix_code(), "GRP");
    }

    #[test]
    fn outcome_success_means_empty_error_slot() {
        let ok = SyncOutcome::from_reply(DirectoryReply {
            changed: true,
            error: None,
            ..Default::default()
        });
        assert!(ok.success);
        assert!(ok.accepted());

        // an empty string in the error slot still counts as success
        let ok = SyncOutcome::from_reply(DirectoryReply {
            changed: true,
            error: Some(String::new()),
            ..Default::default()
        });
        assert!(ok.success);
        assert!(ok.error.is_none());
    }

    #[test]
    fn outcome_with_error_is_not_accepted() {
        let failed = SyncOutcome::from_reply(DirectoryReply {
            changed: true,
            error: Some("KeeperError".to_string()),
            ..Default::default()
        });
        assert!(!failed.success);
        assert!(!failed.accepted());
        assert_eq!(failed.error.as_deref(), Some("KeeperError"));
    }

    #[test]
    fn unchanged_success_is_not_accepted() {
        let noop = SyncOutcome::from_reply(DirectoryReply {
            changed: false,
            error: None,
            ..Default::default()
        });
        assert!(noop.success);
        assert!(!noop.accepted());
    }

    #[test]
    fn failure_outcome_carries_message() {
        let outcome = SyncOutcome::failure("connection refused");
        assert!(!outcome.success);
        assert!(!outcome.changed);
        assert_eq!(outcome.error.as_deref(), Some("connection refused"));
    }
}
