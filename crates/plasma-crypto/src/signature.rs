//! # Recoverable Signatures
//!
//! A [`Signature`] is 65 bytes, `r (32) || s (32) || v (1)`, over a 32-byte
//! digest. The signer's [`Address`] is recovered from the signature itself,
//! so the ledger never stores public keys: an input is authorised when the
//! address recovered from its signature equals the owner of the output it
//! spends.
//!
//! ## Recovery Id
//!
//! `v` is the secp256k1 recovery id, `0` or `1`. The legacy offsets `27` and
//! `28` are accepted on recovery and normalised; signatures produced here
//! always carry `0` or `1`.
//!
//! ## Null Signature
//!
//! Sixty-five zero bytes mark an unsigned slot. The null signature never
//! recovers: [`Signature::signer_address()`] rejects it before touching the
//! curve.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use plasma_core::{decode_hex, Address, Canonical, CanonicalWriter, CodecError, Digest32, PlasmaError};

use crate::account::address_of;

/// Length in bytes of a recoverable signature.
pub const SIGNATURE_LEN: usize = 65;

/// A 65-byte recoverable ECDSA signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; SIGNATURE_LEN]);

impl Default for Signature {
    fn default() -> Self {
        Self::NULL
    }
}

impl Signature {
    /// The null signature.
    pub const NULL: Self = Self([0u8; SIGNATURE_LEN]);

    /// Wrap raw signature bytes.
    pub fn from_bytes(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Self(bytes)
    }

    /// Return the raw 65 bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }

    /// Whether every byte is zero.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Render as lowercase hex without prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from 130 hex chars, with or without `0x`.
    pub fn from_hex(text: &str) -> Result<Self, CodecError> {
        let bytes = decode_hex(text)?;
        Self::from_slice(&bytes)
    }

    /// Parse from a 65-byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
        let arr: [u8; SIGNATURE_LEN] = bytes.try_into().map_err(|_| CodecError::InvalidField {
            field: "signature",
            reason: format!("expected {SIGNATURE_LEN} bytes, got {}", bytes.len()),
        })?;
        Ok(Self(arr))
    }

    /// Recover the address that produced this signature over `digest`.
    ///
    /// Fails with [`PlasmaError::InvalidSignature`] when the signature is
    /// null, malformed, or does not recover to a curve point.
    pub fn signer_address(&self, digest: &Digest32) -> Result<Address, PlasmaError> {
        if self.is_null() {
            return Err(PlasmaError::InvalidSignature);
        }
        let sig = EcdsaSignature::from_slice(&self.0[..64])
            .map_err(|_| PlasmaError::InvalidSignature)?;
        let v = match self.0[64] {
            v @ (0 | 1) => v,
            v @ (27 | 28) => v - 27,
            _ => return Err(PlasmaError::InvalidSignature),
        };
        let recid = RecoveryId::from_byte(v).ok_or(PlasmaError::InvalidSignature)?;
        let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recid)
            .map_err(|_| PlasmaError::InvalidSignature)?;
        Ok(address_of(&key))
    }
}

impl Canonical for Signature {
    fn write_canonical(&self, w: &mut CanonicalWriter) {
        w.put_bytes(&self.0);
    }
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_null() {
            f.write_str("Signature(null)")
        } else {
            write!(f, "Signature(0x{}...)", &self.to_hex()[..16])
        }
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(serde::de::Error::custom)
    }
}
