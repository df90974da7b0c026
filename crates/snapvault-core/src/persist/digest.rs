//! Body digest for persisted state
//!
//! The digest is the hex SHA256 of the body serialized as a
//! `serde_json::Value`. Object keys are sorted in a `Value`, so the same
//! body always serializes to the same bytes.

use crate::errors::Result;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA256 of the canonical body JSON (64 characters)
///
/// # Errors
///
/// Returns `Serialization` if the body cannot be serialized.
pub fn body_digest(body: &Value) -> Result<String> {
    let canonical = serde_json::to_vec(body)?;
    Ok(hash_bytes(&canonical))
}

fn hash_bytes(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}
