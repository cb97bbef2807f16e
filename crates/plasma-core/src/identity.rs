//! # Identity — Owner Addresses
//!
//! An [`Address`] is the 20-byte identity that owns outputs and signs
//! inputs. Comparison is byte-exact; there is no checksum casing or other
//! alternate spelling that could make two encodings of one owner unequal.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::canonical::{decode_hex, Canonical, CanonicalWriter};
use crate::error::CodecError;

/// A 20-byte owner identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The null address, used for empty outputs and null inputs.
    pub const NULL: Self = Self([0u8; 20]);

    /// Create an address from raw bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Return the raw 20 bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the null address.
    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    /// Render as lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from 40 hex chars, with or without `0x`.
    pub fn from_hex(text: &str) -> Result<Self, CodecError> {
        let bytes = decode_hex(text)?;
        let arr: [u8; 20] = bytes.as_slice().try_into().map_err(|_| CodecError::InvalidField {
            field: "address",
            reason: format!("expected 20 bytes, got {}", bytes.len()),
        })?;
        Ok(Self(arr))
    }
}

impl Canonical for Address {
    fn write_canonical(&self, w: &mut CanonicalWriter) {
        w.put_bytes(&self.0);
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address(0x{})", self.to_hex())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_and_without_prefix() {
        let a = Address::from_hex("0x1111111111111111111111111111111111111111").unwrap();
        let b = Address::from_hex("1111111111111111111111111111111111111111").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_bytes(), &[0x11; 20]);
    }

    #[test]
    fn uppercase_hex_is_the_same_address() {
        let a = Address::from_hex("0xABABABABABABABABABABABABABABABABABABABAB").unwrap();
        let b = Address::from_hex("0xabababababababababababababababababababab").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_length_rejected() {
        assert!(Address::from_hex("0x1234").is_err());
        assert!(Address::from_hex("not hex").is_err());
    }

    #[test]
    fn null_address() {
        assert!(Address::NULL.is_null());
        assert!(Address::default().is_null());
        assert!(!Address([1u8; 20]).is_null());
    }

    #[test]
    fn serde_roundtrip() {
        let a = Address([0xab; 20]);
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "ab".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
