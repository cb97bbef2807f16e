//! # Accounts — secp256k1 Signing Keys
//!
//! An [`Account`] holds a private key and the [`Address`] derived from it.
//! The operator signs blocks with one; owners sign inputs and confirmations
//! with theirs.
//!
//! ## Address Derivation
//!
//! `address = SHA256(uncompressed_pubkey[1..65])[12..32]`: the last 20 bytes
//! of the SHA-256 of the 64-byte uncompressed public key without its `0x04`
//! tag.
//!
//! ## Security Invariant
//!
//! - Signing input is a [`Digest32`]: callers hash canonical bytes first.
//! - `Account` does not implement `Serialize`, and its `Debug` output shows
//!   only the address.

use k256::ecdsa::{SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};

use plasma_core::error::CryptoError;
use plasma_core::{decode_hex, Address, Digest32};

use crate::signature::{Signature, SIGNATURE_LEN};

/// A secp256k1 key pair with its derived address.
#[derive(Clone)]
pub struct Account {
    key: SigningKey,
    address: Address,
}

impl Account {
    /// Generate a fresh random account.
    pub fn generate() -> Self {
        let key = SigningKey::random(&mut rand::rngs::OsRng);
        Self::from_signing_key(key)
    }

    /// Load from a 32-byte private key.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key = SigningKey::from_slice(bytes)
            .map_err(|e| CryptoError::KeyError(format!("invalid private key: {e}")))?;
        Ok(Self::from_signing_key(key))
    }

    /// Load from a hex private key, with or without `0x`.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let bytes = decode_hex(text).map_err(|e| CryptoError::KeyError(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    fn from_signing_key(key: SigningKey) -> Self {
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    /// The address derived from this account's public key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32-byte digest, producing a recoverable signature.
    pub fn sign(&self, digest: &Digest32) -> Result<Signature, CryptoError> {
        let (sig, recid) = self
            .key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;
        let mut out = [0u8; SIGNATURE_LEN];
        out[..64].copy_from_slice(&sig.to_bytes());
        out[64] = recid.to_byte();
        Ok(Signature(out))
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Derive the address of a public key.
pub(crate) fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = Sha256::digest(&point.as_bytes()[1..]);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    Address(out)
}
