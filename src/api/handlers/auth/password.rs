//! Password hashing and verification.
//!
//! Argon2id with the crate defaults; the PHC hash string embeds its own salt
//! and cost parameters.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hash a plaintext password into a PHC-formatted string.
///
/// # Errors
/// Returns an error if the hasher itself fails; never on weak input, which is
/// validated at the API boundary.
pub fn hash(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored hash.
///
/// Malformed hashes verify as `false` rather than erroring, so a corrupted
/// row behaves like a wrong password.
#[must_use]
pub fn verify(plaintext: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_verifies() {
        let hashed = hash("12345678").expect("hash");
        assert!(hashed.starts_with("$argon2id$"));
        assert!(verify("12345678", &hashed));
    }

    #[test]
    fn wrong_password_rejected() {
        let hashed = hash("12345678").expect("hash");
        assert!(!verify("87654321", &hashed));
    }

    #[test]
    fn malformed_hash_is_false_not_error() {
        assert!(!verify("12345678", "not-a-phc-string"));
        assert!(!verify("12345678", ""));
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash("12345678").expect("hash");
        let second = hash("12345678").expect("hash");
        assert_ne!(first, second);
    }
}
