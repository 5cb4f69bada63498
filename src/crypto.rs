//! Credential hashing.
//!
//! Two distinct needs, two distinct primitives:
//! - Customer passwords get Argon2id (memory-hard, per-password salt, PHC
//!   string stored in `users.password_hash`).
//! - Session tokens are already high-entropy random strings, so a salted
//!   SHA-256 digest is enough for the lookup column.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use sha2::{Digest, Sha256};

use crate::error::{AppError, Result};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password with Argon2id, returning the PHC string for storage.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string.
///
/// An unparseable stored hash verifies as false rather than erroring, so a
/// corrupted row reads as bad credentials instead of a 500.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hash a secret for database lookups (session tokens).
/// Uses SHA-256 with application salt, returns lowercase hex string.
pub fn hash_secret(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"fiberdesk-v1:");
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
