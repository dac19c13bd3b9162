//! Password hashing with Argon2id.
//!
//! Uses the Argon2id variant with cost parameters taken from configuration.
//! The repository layer calls [`ensure_hashed`] on every credential write, so a
//! plaintext password never reaches the store even when an admin patches it.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, Version,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Prefix shared by every PHC string this module produces.
pub const HASH_PREFIX: &str = "$argon2";

/// Errors that can occur during password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Failed to hash password.
    #[error("failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password.
    #[error("failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format.
    #[error("invalid password hash format")]
    InvalidHash,

    /// The configured cost parameters are rejected by Argon2.
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),
}

/// Argon2 cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl PasswordPolicy {
    fn hasher(&self) -> Result<Argon2<'static>, PasswordError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Hashes a password using Argon2id.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails, or
/// `PasswordError::InvalidParams` if the policy is out of range.
///
/// # Example
///
/// ```
/// use opsdesk_core::auth::{PasswordPolicy, hash_password};
///
/// let hash = hash_password("my_secure_password", &PasswordPolicy::default()).unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str, policy: &PasswordPolicy) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    policy
        .hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::HashError(e.to_string()))
}

/// Verifies a password against a hash.
///
/// Cost parameters are read from the hash itself, so hashes produced under an
/// older policy keep verifying.
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the hash format is invalid.
/// Returns `PasswordError::VerifyError` if verification fails unexpectedly.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(e.to_string())),
    }
}

/// Spends one hash of work under `policy` and reports a mismatch.
///
/// Login calls this when no account matches the email, so unknown and
/// known addresses cost the same time.
///
/// # Errors
///
/// Propagates hashing failures from [`hash_password`].
pub fn verify_missing(password: &str, policy: &PasswordPolicy) -> Result<bool, PasswordError> {
    hash_password(password, policy).map(|_| false)
}

/// Returns true if the value already looks like a stored Argon2 hash.
#[must_use]
pub fn looks_hashed(value: &str) -> bool {
    value.starts_with(HASH_PREFIX) && PasswordHash::new(value).is_ok()
}

/// Hashes the candidate unless it is already an Argon2 hash.
///
/// # Errors
///
/// Propagates hashing failures from [`hash_password`].
pub fn ensure_hashed(candidate: &str, policy: &PasswordPolicy) -> Result<String, PasswordError> {
    if looks_hashed(candidate) {
        return Ok(candidate.to_string());
    }
    hash_password(candidate, policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Small costs keep the suite fast.
    fn policy() -> PasswordPolicy {
        PasswordPolicy {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn test_hash_password() {
        let password = "test_password_123!";
        let hash = hash_password(password, &policy()).unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, password);
    }

    #[test]
    fn test_verify_correct_password() {
        let hash = hash_password("correct_password", &policy()).unwrap();
        assert!(verify_password("correct_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("correct_password", &policy()).unwrap();
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_password_different_salts() {
        let hash1 = hash_password("password1", &policy()).unwrap();
        let hash2 = hash_password("password1", &policy()).unwrap();
        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "invalid_hash");
        assert!(matches!(result, Err(PasswordError::InvalidHash)));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let bad = PasswordPolicy {
            memory_kib: 1,
            iterations: 0,
            parallelism: 0,
        };
        assert!(matches!(
            hash_password("pw", &bad),
            Err(PasswordError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_verify_missing_never_matches() {
        assert!(!verify_missing("any password", &policy()).unwrap());
        assert!(!verify_missing("", &policy()).unwrap());
    }

    #[test]
    fn test_ensure_hashed_hashes_plaintext() {
        let stored = ensure_hashed("s3cret-pass", &policy()).unwrap();
        assert!(looks_hashed(&stored));
        assert!(verify_password("s3cret-pass", &stored).unwrap());
    }

    #[test]
    fn test_ensure_hashed_keeps_existing_hash() {
        let hash = hash_password("s3cret-pass", &policy()).unwrap();
        let stored = ensure_hashed(&hash, &policy()).unwrap();
        assert_eq!(stored, hash);
    }

    #[test]
    fn test_plaintext_with_prefix_is_still_hashed() {
        assert!(!looks_hashed("$argon2 is my password"));
        let stored = ensure_hashed("$argon2 is my password", &policy()).unwrap();
        assert!(verify_password("$argon2 is my password", &stored).unwrap());
    }
}
