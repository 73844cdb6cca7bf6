//! Credential primitives: password hashing and API token generation.

pub mod password;

pub use password::{generate_token_key, hash_password, unusable_password, verify_password, PasswordError};
