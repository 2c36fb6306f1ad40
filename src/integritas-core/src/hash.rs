//! Hash normalization.
//!
//! Tool callers supply content hashes as hex (with or without a `0x`
//! prefix) or base64. The upstream expects lowercase hex with no prefix.

use base64::Engine;

use crate::error::AdapterError;

/// Normalize a caller-supplied hash to lowercase hex without a `0x` prefix.
///
/// Accepts hex (with/without `0x`) or standard base64.
///
/// # Errors
///
/// Returns [`AdapterError::InvalidInput`] if the value is empty or neither
/// valid hex nor valid base64.
pub fn normalize_hash(value: &str) -> Result<String, AdapterError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(AdapterError::InvalidInput {
            message: "Hash must not be empty".into(),
        });
    }

    let unprefixed = v
        .strip_prefix("0x")
        .or_else(|| v.strip_prefix("0X"))
        .unwrap_or(v);
    if !unprefixed.is_empty() && unprefixed.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Ok(unprefixed.to_ascii_lowercase());
    }

    let raw = base64::engine::general_purpose::STANDARD
        .decode(v)
        .map_err(|_| AdapterError::InvalidInput {
            message: "Hash must be hex (with/without 0x) or base64".into(),
        })?;
    Ok(hex::encode(raw))
}

/// Compute the lowercase hex SHA-256 of a byte slice.
///
/// Convenience for callers stamping local content instead of a precomputed
/// hash.
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_passthrough_lowercased() {
        assert_eq!(normalize_hash("DEADBEEF").unwrap(), "deadbeef");
        assert_eq!(normalize_hash("deadbeef").unwrap(), "deadbeef");
    }

    #[test]
    fn test_0x_prefix_stripped() {
        assert_eq!(normalize_hash("0xDEADBEEF").unwrap(), "deadbeef");
        assert_eq!(normalize_hash("0Xdeadbeef").unwrap(), "deadbeef");
    }

    #[test]
    fn test_base64_decoded_to_hex() {
        // "3q2+7w==" is base64 for 0xDEADBEEF.
        assert_eq!(normalize_hash("3q2+7w==").unwrap(), "deadbeef");
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(normalize_hash("  deadbeef  ").unwrap(), "deadbeef");
    }

    #[test]
    fn test_empty_rejected() {
        assert!(normalize_hash("").is_err());
        assert!(normalize_hash("   ").is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            normalize_hash("not-a-hash!!"),
            Err(AdapterError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_sha256_hex() {
        // SHA-256 of the empty input.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
