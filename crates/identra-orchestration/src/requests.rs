//! Use-case requests accepted by the orchestration services.
//!
//! The calling layer maps its DTOs onto these; field-level mapping stays
//! outside this crate.

use chrono::{DateTime, Utc};
use identra_core::AuthMode;
use serde::Deserialize;

/// Create an account.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccountRequest {
    /// Externally supplied identifier; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub login: String,
    pub display_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
    /// Requested mode; the tenant policy may override it.
    #[serde(default)]
    pub auth_mode: Option<AuthMode>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Groups the account joins on creation; must all exist.
    #[serde(default)]
    pub group_ids: Vec<String>,
    /// Accounts named as substitutes; must all exist.
    #[serde(default)]
    pub substitute_ids: Vec<String>,
}

/// Update an account. Unset fields stay unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAccountRequest {
    /// The concurrency token from the caller's read.
    pub revision: i64,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// New password; rotation appends the previous hash to the history.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auth_mode: Option<AuthMode>,
}

/// One permission grant in a group request.
#[derive(Debug, Clone, Deserialize)]
pub struct GrantRequest {
    pub permission_id: String,
    /// Operation bitmask.
    pub operations: i32,
}

/// Create a group.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroupRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub grants: Vec<GrantRequest>,
    /// Member accounts; must all exist.
    #[serde(default)]
    pub member_ids: Vec<String>,
}

/// Update a group. Unset fields stay unchanged.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateGroupRequest {
    /// The concurrency token from the caller's read.
    pub revision: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Replaces the grant set when present.
    #[serde(default)]
    pub grants: Option<Vec<GrantRequest>>,
}
