//! Effective authentication-mode resolution.

use identra_core::AuthMode;
use identra_db::TenantAuthPolicy;
use tracing::debug;

use crate::error::OrchestrationError;

/// Resolve the effective mode from the tenant policy and the request.
///
/// The policy is authoritative: a forced tenant-wide mode wins over any
/// requested mode. Without a forced mode the request decides, defaulting
/// to password authentication.
///
/// # Errors
///
/// `OrchestrationError::Internal` when the policy row carries a tag that
/// is not a known mode.
pub fn resolve_auth_mode(
    policy: &TenantAuthPolicy,
    requested: Option<AuthMode>,
) -> Result<AuthMode, OrchestrationError> {
    if let Some(forced_tag) = &policy.forced_auth_mode {
        let forced = AuthMode::parse(forced_tag).ok_or_else(|| OrchestrationError::Internal {
            message: format!("tenant policy carries unknown auth mode tag '{forced_tag}'"),
        })?;
        if requested.is_some_and(|r| r != forced) {
            debug!(
                tenant_id = %policy.tenant_id,
                forced = %forced,
                "Tenant policy overrides requested auth mode"
            );
        }
        return Ok(forced);
    }

    Ok(requested.unwrap_or(AuthMode::Password))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn policy(forced: Option<&str>) -> TenantAuthPolicy {
        TenantAuthPolicy {
            tenant_id: Uuid::new_v4(),
            forced_auth_mode: forced.map(str::to_string),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn request_decides_without_forced_mode() {
        let p = policy(None);
        assert_eq!(
            resolve_auth_mode(&p, Some(AuthMode::Federated)).unwrap(),
            AuthMode::Federated
        );
    }

    #[test]
    fn defaults_to_password() {
        let p = policy(None);
        assert_eq!(resolve_auth_mode(&p, None).unwrap(), AuthMode::Password);
    }

    #[test]
    fn forced_mode_wins_over_request() {
        let p = policy(Some("federated"));
        assert_eq!(
            resolve_auth_mode(&p, Some(AuthMode::Password)).unwrap(),
            AuthMode::Federated
        );
        assert_eq!(resolve_auth_mode(&p, None).unwrap(), AuthMode::Federated);
    }

    #[test]
    fn unknown_forced_tag_is_an_internal_error() {
        let p = policy(Some("kerberos"));
        let err = resolve_auth_mode(&p, None).unwrap_err();
        assert!(matches!(err, OrchestrationError::Internal { .. }));
    }
}
