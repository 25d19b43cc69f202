//! Domain event payloads.

pub mod account;
pub mod group;

pub use account::{AccountDeleted, AccountUpserted};
pub use group::{GroupDeleted, GroupUpserted};
