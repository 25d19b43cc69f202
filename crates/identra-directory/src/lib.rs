//! # identra-directory
//!
//! Adapter for the legacy directory keeper: an external, non-transactional
//! system holding one denormalized XML record per account and group,
//! driven by a stored-procedure-like positional call.
//!
//! ## Modules
//!
//! - [`command`] - the keeper's positional call contract and `SyncOutcome`
//! - [`transport`] - the raw invocation boundary (`DirectoryTransport`)
//!   plus the Postgres-backed implementation
//! - [`synchronizer`] - failure-contained `DirectorySynchronizer`
//! - [`payload`] - XML record builder
//!
//! The keeper shares no transaction with the primary store. The
//! synchronizer therefore never throws: every failure becomes a failed
//! `SyncOutcome`, and the orchestration turns that into its commit or
//! rollback decision.

pub mod command;
pub mod error;
pub mod payload;
pub mod synchronizer;
pub mod transport;

pub use command::{DirectoryReply, EntityKind, RemoveCommand, SyncOutcome, UpsertCommand};
pub use error::{DirectoryError, DirectoryResult};
pub use payload::RecordPayload;
pub use synchronizer::DirectorySynchronizer;
pub use transport::{DirectoryTransport, PgDirectoryTransport};
