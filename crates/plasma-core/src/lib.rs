//! # plasma-core — Foundational Types for the Child Chain
//!
//! This crate is the leaf of the workspace. It defines the primitives every
//! other crate builds on and depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One closed error enumeration.** [`PlasmaError`] names every way a
//!    ledger operation can be rejected, and [`ErrorKind`] groups those names
//!    into the six kinds callers map onto transport codes. Adding a variant
//!    forces every `match` to handle it.
//!
//! 2. **`CanonicalBytes` newtype.** All digest computation flows through
//!    [`CanonicalBytes::new()`], which drives a type's [`Canonical`]
//!    implementation through a fixed-width big-endian writer. An on-chain
//!    verifier reproduces these bytes exactly.
//!
//! 3. **`sha256_digest()` accepts only `&CanonicalBytes`.** No hash in the
//!    ledger is computed over ad hoc bytes.
//!
//! 4. **Arithmetic position packing.** [`Position`] packs block number,
//!    transaction index and slot index with multiplication and addition so a
//!    verifier with only integer div/mod decodes it identically.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `plasma-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod position;

pub use canonical::{decode_hex, Canonical, CanonicalBytes, CanonicalReader, CanonicalWriter};
pub use digest::{sha256_digest, sha256_tagged, Digest32};
pub use error::{CodecError, CryptoError, ErrorKind, PlasmaError, StoreError};
pub use identity::Address;
pub use position::Position;

/// Number of input slots in every transaction.
pub const TX_INPUTS: usize = 2;

/// Number of output slots in every transaction.
pub const TX_OUTPUTS: usize = 2;

/// Depth of the per-block transaction Merkle tree.
pub const MERKLE_DEPTH: usize = 16;

/// Maximum number of leaves a block's Merkle tree can hold.
pub const MERKLE_CAPACITY: usize = 1 << MERKLE_DEPTH;

/// Result alias used across the ledger crates.
pub type PlasmaResult<T> = Result<T, PlasmaError>;
