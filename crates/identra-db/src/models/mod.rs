//! Primary-store entity models.

pub mod account;
pub mod credential_history;
pub mod group;
pub mod group_membership;
pub mod group_permission_grant;
pub mod permission;
pub mod substitution_link;
pub mod tenant_policy;

pub use account::{Account, NewAccount};
pub use credential_history::CredentialHistoryEntry;
pub use group::{Group, NewGroup};
pub use group_membership::{GroupMembership, MemberInfo, MembershipGroupInfo};
pub use group_permission_grant::{
    mask_allows, GrantSpec, GroupPermissionGrant, OP_APPROVE, OP_READ, OP_WRITE,
};
pub use permission::Permission;
pub use substitution_link::SubstitutionLink;
pub use tenant_policy::TenantAuthPolicy;
