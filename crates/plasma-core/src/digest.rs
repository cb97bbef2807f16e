//! # Digests — 32-Byte SHA-256 Hashes
//!
//! Defines `Digest32`, the hash type for transactions, blocks, confirmation
//! messages and Merkle roots.
//!
//! ## Security Invariant
//!
//! `Digest32` values for ledger objects can only be computed from
//! `CanonicalBytes`, ensuring that every hash an on-chain verifier checks was
//! produced from the canonical encoding. This is enforced by the function
//! signature of [`sha256_digest()`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::canonical::{decode_hex, Canonical, CanonicalBytes, CanonicalWriter};
use crate::error::CodecError;

/// A 32-byte digest.
///
/// Serializes as a `0x`-prefixed lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Digest32(pub [u8; 32]);

impl Digest32 {
    /// The all-zero digest.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a digest from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render as lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from 64 hex chars, with or without `0x`.
    pub fn from_hex(text: &str) -> Result<Self, CodecError> {
        let bytes = decode_hex(text)?;
        let arr: [u8; 32] = bytes.as_slice().try_into().map_err(|_| CodecError::InvalidField {
            field: "digest",
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        })?;
        Ok(Self(arr))
    }
}

impl Canonical for Digest32 {
    fn write_canonical(&self, w: &mut CanonicalWriter) {
        w.put_bytes(&self.0);
    }
}

impl std::fmt::Debug for Digest32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Digest32(0x{})", self.to_hex())
    }
}

impl std::fmt::Display for Digest32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for Digest32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

/// Compute the SHA-256 digest of canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> Digest32 {
    let hash = Sha256::digest(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hash);
    Digest32(bytes)
}

/// Compute SHA-256 over a domain tag followed by canonical bytes.
///
/// Used where two digests over the same value must never collide, e.g. the
/// transaction hash and the confirmation message.
pub fn sha256_tagged(tag: &[u8], data: &CanonicalBytes) -> Digest32 {
    let mut hasher = Sha256::new();
    hasher.update(tag);
    hasher.update(data.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&hasher.finalize());
    Digest32(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Raw(&'static [u8]);

    impl Canonical for Raw {
        fn write_canonical(&self, w: &mut CanonicalWriter) {
            w.put_bytes(self.0);
        }
    }

    #[test]
    fn test_known_sha256_vector() {
        // SHA-256 of the empty string.
        let d = sha256_digest(&CanonicalBytes::new(&Raw(b"")));
        assert_eq!(
            d.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_tagged_differs_from_plain() {
        let cb = CanonicalBytes::new(&Raw(b"abc"));
        assert_ne!(sha256_digest(&cb), sha256_tagged(b"tag", &cb));
        assert_eq!(sha256_tagged(b"tag", &cb), sha256_tagged(b"tag", &cb));
    }

    #[test]
    fn test_hex_roundtrip_and_display() {
        let d = sha256_digest(&CanonicalBytes::new(&Raw(b"x")));
        let shown = d.to_string();
        assert!(shown.starts_with("0x"));
        assert_eq!(shown.len(), 66);
        assert_eq!(Digest32::from_hex(&shown).unwrap(), d);
        assert!(Digest32::from_hex("0xabcd").is_err());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let d = Digest32([7u8; 32]);
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json.len(), 66 + 2);
        let back: Digest32 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
