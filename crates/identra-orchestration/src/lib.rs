//! # identra-orchestration
//!
//! The entity orchestration services: the composing layer that turns an
//! account or group use case into a coordinated store write, a directory
//! keeper synchronization, a single commit/rollback decision, and a
//! post-commit event publication.
//!
//! ## Control flow of a synchronized write
//!
//! 1. Validate input and referenced collaborators (no transaction yet)
//! 2. Resolve the effective authentication mode from tenant policy
//! 3. Issue a generated identifier when none is supplied
//! 4. `begin()` on an exclusively owned transaction coordinator
//! 5. Stage the write through the repository
//! 6. Invoke the directory synchronizer with the serialized entity
//! 7. `define(success && changed)`, the single decision point
//! 8. On commit, publish the event through the publish pipeline
//!
//! Every entry point runs inside the injected store retry pipeline, so
//! transient store failures re-run the whole use case; directory outcomes
//! are never retried at the sub-step level.

pub mod account_service;
pub mod auth_mode;
pub mod credentials;
pub mod error;
pub mod group_service;
pub mod requests;
pub mod validation;

mod projection;
mod publish;

pub use account_service::AccountService;
pub use auth_mode::resolve_auth_mode;
pub use credentials::CredentialHasher;
pub use error::OrchestrationError;
pub use group_service::GroupService;
pub use requests::{
    CreateAccountRequest, CreateGroupRequest, GrantRequest, UpdateAccountRequest,
    UpdateGroupRequest,
};
