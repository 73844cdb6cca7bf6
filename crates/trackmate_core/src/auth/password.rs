//! Argon2 password hashing and random token keys.
//!
//! # Invariants
//! - Stored hashes are PHC strings produced by Argon2 with a fresh salt.
//! - An unusable hash starts with `!` and never verifies.
//! - Token keys are 40 lowercase hex characters from the OS RNG.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use log::error;
use rand_core::{OsRng, RngCore};
use std::error::Error;
use std::fmt::{Display, Formatter};

const UNUSABLE_PREFIX: char = '!';
const TOKEN_BYTES: usize = 20;

/// Hashing backend failure. Carries the backend message only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordError(String);

impl Display for PasswordError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "password hashing failed: {}", self.0)
    }
}

impl Error for PasswordError {}

pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            error!("event=password_hash module=auth status=error error={err}");
            PasswordError(err.to_string())
        })
}

/// Marker stored for accounts created without a password.
pub fn unusable_password() -> String {
    format!("{UNUSABLE_PREFIX}{}", generate_token_key())
}

/// Checks `plain` against `stored`. Unusable or malformed hashes never match.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    if stored.starts_with(UNUSABLE_PREFIX) {
        return false;
    }
    let parsed = match PasswordHash::new(stored) {
        Ok(parsed) => parsed,
        Err(err) => {
            error!("event=password_verify module=auth status=error error={err}");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

pub fn generate_token_key() -> String {
    let mut bytes = [0_u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::{generate_token_key, hash_password, unusable_password, verify_password};

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("correct-horse").expect("hashing should succeed");
        assert!(verify_password("correct-horse", &hash));
        assert!(!verify_password("wrong-horse", &hash));
    }

    #[test]
    fn unusable_password_never_verifies() {
        let marker = unusable_password();
        assert!(!verify_password("", &marker));
        assert!(!verify_password(&marker, &marker));
    }

    #[test]
    fn malformed_hash_does_not_verify() {
        assert!(!verify_password("anything", "not-a-valid-hash"));
    }

    #[test]
    fn token_keys_are_forty_hex_chars() {
        let key = generate_token_key();
        assert_eq!(key.len(), 40);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_token_key());
    }
}
