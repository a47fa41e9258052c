//! Password Hashing and Verification
//!
//! New secrets are hashed with Argon2id. Verification also accepts accounts
//! created before hashing was introduced, whose stored value is the plaintext.
//!
//! This crate has no account store. These functions are the interface for the
//! persistence/login layer that owns user records: hash on sign-up or password
//! change, verify on login before calling `TokenEngine::issue_token_pair`.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2};
use subtle::ConstantTimeEq;

use crate::error::AppError;

/// Stored credential, classified before any comparison happens
enum StoredSecret<'a> {
    Argon2(PasswordHash<'a>),
    Legacy(&'a str),
}

impl<'a> StoredSecret<'a> {
    /// Only a PHC string naming an Argon2 variant counts as a hash.
    /// Anything else, including hashes of other schemes, is a legacy record.
    fn classify(stored: &'a str) -> Self {
        match PasswordHash::new(stored) {
            Ok(parsed) if Algorithm::try_from(parsed.algorithm).is_ok() => {
                StoredSecret::Argon2(parsed)
            }
            _ => StoredSecret::Legacy(stored),
        }
    }
}

/// Hash a password into a self-describing PHC string with a fresh random salt
///
/// # Errors
/// Returns an internal error if the hasher fails
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored value that is either an Argon2 hash
/// or a legacy plaintext record. Never errors: an empty record is `false`.
pub fn verify_password(password: &str, stored: &str) -> bool {
    if stored.is_empty() {
        return false;
    }

    match StoredSecret::classify(stored) {
        // A mismatch here is final; it must not fall through to the plaintext path.
        StoredSecret::Argon2(hash) => Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok(),
        StoredSecret::Legacy(plaintext) => {
            tracing::debug!("Verifying against legacy plaintext credential");
            password.as_bytes().ct_eq(plaintext.as_bytes()).into()
        }
    }
}
