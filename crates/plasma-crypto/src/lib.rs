//! # plasma-crypto — Cryptographic Primitives
//!
//! Provides the cryptographic building blocks for the child chain:
//!
//! - **secp256k1 recoverable ECDSA** for input, confirmation and block
//!   signatures. Signers are identified by the address recovered from the
//!   signature, never by a stored public key.
//! - **Fixed-depth Merkle tree** committing a block's transactions to a
//!   single root the operator publishes to the root chain.
//!
//! ## Crate Policy
//!
//! - Depends only on `plasma-core` internally.
//! - No mocking of cryptographic operations in tests: all tests use real
//!   keys, real SHA-256 and real secp256k1.
//! - No `unsafe` code.

pub mod account;
pub mod merkle;
pub mod signature;

pub use account::Account;
pub use merkle::{verify_membership, FixedMerkleTree};
pub use signature::{Signature, SIGNATURE_LEN};
