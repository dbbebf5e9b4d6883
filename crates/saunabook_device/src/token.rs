// --- File: crates/saunabook_device/src/token.rs ---
//! Device setup tokens.
//!
//! Tokens are handed to an operator once and never stored; the backend only
//! keeps their SHA-256 digest.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A fresh random setup token.
pub fn generate_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Lowercase hex SHA-256 of `token`, surrounding whitespace ignored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.trim().as_bytes());
    hex::encode(hasher.finalize())
}
