//! # plasma-chain — UTXO Ledger Engine
//!
//! The transaction model, blocks, the persistence contract, and the
//! [`ChildChain`] engine that ties them together.
//!
//! ## Financial-Safety Invariants
//!
//! - **No double spend.** An output's `spent` flag flips exactly once; a
//!   transaction referencing a spent output (or the same output twice) is
//!   rejected with `TxOutAlreadySpent`.
//! - **Balance.** Accepted transactions satisfy
//!   `sum(inputs) >= sum(outputs)`. Sums are computed in `u128`.
//! - **Authenticated transfer.** Each real input's signature recovers to the
//!   owner of the output it spends.
//! - **Atomicity.** Validation runs to completion before any state changes,
//!   and in-memory state changes only after the store commit succeeds.
//!
//! ## Crate Policy
//!
//! - Depends on `plasma-core` and `plasma-crypto` internally.
//! - All shared state lives in one `ChildChain`; there are no free functions
//!   over global maps.

pub mod block;
pub mod childchain;
pub mod store;
pub mod tx;

pub use block::{Block, BlockSummary};
pub use childchain::{ChainConfig, ChildChain, DEFAULT_BLOCK_NUMBER};
pub use store::{KvStore, MemoryStore, SledStore, WriteBatch, WriteOp};
pub use tx::{OutputRef, Tx, TxIn, TxOut};
