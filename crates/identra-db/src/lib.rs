//! # identra-db
//!
//! Primary-store access for identra.
//!
//! Provides the entity models, per-entity repository capabilities, the
//! transaction coordinator used by the orchestration services, and the
//! optimistic concurrency resolver.
//!
//! ## Modules
//!
//! - [`models`] - `FromRow` entity models with CRUD methods
//! - [`repository`] - `Reader`/`Writer` capability traits per entity
//! - [`transaction`] - `Idle → InTransaction → {Committed, RolledBack}`
//!   coordinator with a single commit/rollback decision point
//! - [`concurrency`] - revision-guarded persist wrapper
//! - [`migrations`] - embedded sqlx migrations (incl. permission seed)
//!
//! Reads take `&PgPool`; writes take `&mut PgConnection` so they can be
//! staged inside the coordinator's open transaction.

pub mod concurrency;
pub mod error;
pub mod migrations;
pub mod models;
pub mod repository;
pub mod transaction;

pub use concurrency::ConcurrencyResolver;
pub use error::{DbError, DbResult};
pub use migrations::run_migrations;
pub use models::{
    Account, CredentialHistoryEntry, GrantSpec, Group, GroupMembership, GroupPermissionGrant,
    NewAccount, NewGroup, Permission, SubstitutionLink, TenantAuthPolicy,
};
pub use repository::{AccountRepository, GroupRepository, Reader, Writer};
pub use transaction::{TransactionCoordinator, TxState};
