//! Input validation for the orchestration services.
//!
//! Business-rule checks run before any transaction opens and are never
//! retried.

use identra_core::AuthMode;

use crate::error::OrchestrationError;

/// Maximum length of logins and group names.
const MAX_NAME_LEN: usize = 64;

/// Validate an account login: non-empty, bounded, safe charset.
pub fn validate_login(login: &str) -> Result<(), OrchestrationError> {
    if login.trim().is_empty() {
        return Err(OrchestrationError::validation("login", "login is required"));
    }
    if login.len() > MAX_NAME_LEN {
        return Err(OrchestrationError::validation(
            "login",
            format!("login must not exceed {MAX_NAME_LEN} characters"),
        ));
    }
    if !login
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(OrchestrationError::validation(
            "login",
            "login may contain only letters, digits, '.', '_' and '-'",
        ));
    }
    Ok(())
}

/// Validate a group name: non-empty and bounded.
pub fn validate_group_name(name: &str) -> Result<(), OrchestrationError> {
    if name.trim().is_empty() {
        return Err(OrchestrationError::validation("name", "name is required"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(OrchestrationError::validation(
            "name",
            format!("name must not exceed {MAX_NAME_LEN} characters"),
        ));
    }
    Ok(())
}

/// Validate a display name: non-empty.
pub fn validate_display_name(display_name: &str) -> Result<(), OrchestrationError> {
    if display_name.trim().is_empty() {
        return Err(OrchestrationError::validation(
            "display_name",
            "display name is required",
        ));
    }
    Ok(())
}

/// Validate a password for storage: non-empty.
pub fn validate_password(password: &str) -> Result<(), OrchestrationError> {
    if password.is_empty() {
        return Err(OrchestrationError::validation(
            "password",
            "password is required",
        ));
    }
    Ok(())
}

/// Validate a grant's operation bitmask against the known bits.
pub fn validate_operations_mask(mask: i32) -> Result<(), OrchestrationError> {
    use identra_db::models::{OP_APPROVE, OP_READ, OP_WRITE};

    let known = OP_READ | OP_WRITE | OP_APPROVE;
    if mask & !known != 0 {
        return Err(OrchestrationError::validation(
            "operations",
            format!("operation mask {mask} carries unknown bits"),
        ));
    }
    Ok(())
}

/// Mode/email consistency: federated accounts need an email address for
/// identity-provider correlation.
pub fn validate_mode_email(
    mode: AuthMode,
    email: Option<&str>,
) -> Result<(), OrchestrationError> {
    if mode == AuthMode::Federated && email.map_or(true, |e| e.trim().is_empty()) {
        return Err(OrchestrationError::validation(
            "email",
            "federated accounts require an email address",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_charset() {
        assert!(validate_login("jane.doe").is_ok());
        assert!(validate_login("jane_doe-2").is_ok());
        assert!(validate_login("").is_err());
        assert!(validate_login("   ").is_err());
        assert!(validate_login("jane doe").is_err());
        assert!(validate_login("jane@doe").is_err());
    }

    #[test]
    fn login_length_bound() {
        let long = "a".repeat(MAX_NAME_LEN + 1);
        assert!(validate_login(&long).is_err());
        let ok = "a".repeat(MAX_NAME_LEN);
        assert!(validate_login(&ok).is_ok());
    }

    #[test]
    fn group_name_required() {
        assert!(validate_group_name("Auditors").is_ok());
        assert!(validate_group_name(" ").is_err());
    }

    #[test]
    fn federated_requires_email() {
        assert!(validate_mode_email(AuthMode::Federated, Some("j@example.com")).is_ok());
        assert!(validate_mode_email(AuthMode::Federated, None).is_err());
        assert!(validate_mode_email(AuthMode::Federated, Some("  ")).is_err());
        assert!(validate_mode_email(AuthMode::Password, None).is_ok());
    }

    #[test]
    fn operations_mask_bits() {
        use identra_db::models::{OP_APPROVE, OP_READ, OP_WRITE};

        assert!(validate_operations_mask(0).is_ok());
        assert!(validate_operations_mask(OP_READ | OP_WRITE | OP_APPROVE).is_ok());
        assert!(validate_operations_mask(8).is_err());
        assert!(validate_operations_mask(OP_READ | 16).is_err());
    }

    #[test]
    fn password_required() {
        assert!(validate_password("secret").is_ok());
        let err = validate_password("").unwrap_err();
        assert_eq!(err.category(), "validation");
    }
}
