//! Credential hashing with Argon2id.

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::error::OrchestrationError;

/// Argon2id hasher with OWASP-recommended parameters.
///
/// - Memory: 19456 KiB (19 MiB)
/// - Iterations: 2
/// - Parallelism: 1
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialHasher {
    /// Create a hasher with the recommended parameters.
    #[must_use]
    pub fn new() -> Self {
        // These constants are always valid; a failure indicates a bug in
        // the argon2 crate, not a runtime condition.
        let params = Params::new(19456, 2, 1, None)
            .expect("OWASP Argon2 parameters are valid constants");

        Self { params }
    }

    /// Hash a password, producing a PHC-formatted string.
    pub fn hash(&self, password: &str) -> Result<String, OrchestrationError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| OrchestrationError::Internal {
                message: format!("password hashing failed: {e}"),
            })?;

        Ok(hash.to_string())
    }

    /// Verify a password against a stored hash.
    ///
    /// Malformed hashes and mismatches both verify as false.
    #[must_use]
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(hash) else {
            return false;
        };
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Small parameters to keep the tests fast
    fn fast_hasher() -> CredentialHasher {
        CredentialHasher {
            params: Params::new(4096, 1, 1, None).unwrap(),
        }
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let hasher = fast_hasher();
        let hash = hasher.hash("password").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("password", &hash));
        assert!(!hasher.verify("wrong", &hash));
    }

    #[test]
    fn hashes_are_salted() {
        let hasher = fast_hasher();
        let a = hasher.hash("password").unwrap();
        let b = hasher.hash("password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_verifies_false() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("password", "not-a-hash"));
    }
}
