//! # Root-Chain Collaborator Trait
//!
//! The child chain reads and writes the root-chain contract only through
//! [`RootChain`]. Implementations range from the in-memory
//! [`MemoryRootChain`](crate::mock::MemoryRootChain) used in tests and local
//! runs to a JSON-RPC contract client living outside this workspace.
//!
//! ## Object Safety
//!
//! Methods return boxed futures so the operator binary can hold an
//! `Arc<dyn RootChain>` and pick the implementation at startup.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use plasma_core::{Address, Digest32, PlasmaError};
use plasma_crypto::Account;

/// Boxed future returned by [`RootChain`] methods.
pub type RootChainFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RootChainError>> + Send + 'a>>;

/// Error talking to the root chain.
#[derive(Error, Debug)]
pub enum RootChainError {
    /// The transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The contract refused the call.
    #[error("rejected by root chain: {0}")]
    Rejected(String),

    /// The event subscription ended.
    #[error("deposit subscription closed")]
    SubscriptionClosed,

    /// Child and root chain disagree on the current block number.
    #[error("blockchain is not synchronized (root chain {root_chain}, child chain {child_chain})")]
    NotSynchronized {
        /// Root chain's current plasma block number.
        root_chain: u64,
        /// Child chain's open block number.
        child_chain: u64,
    },

    /// A ledger read needed for the call failed.
    #[error(transparent)]
    Ledger(#[from] PlasmaError),
}

/// A `DepositCreated` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
    /// Depositor, owner of the new output.
    pub owner: Address,
    /// Deposited value.
    pub amount: u64,
    /// Block number the contract assigned to the deposit.
    pub deposit_block_number: u64,
}

/// Acknowledgement of a committed block root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// Plasma block number the root was recorded under.
    pub plasma_block_number: u64,
    /// The committed root.
    pub root: Digest32,
}

/// Operations the child chain needs from the root-chain contract.
pub trait RootChain: Send + Sync {
    /// The contract's current plasma block number.
    fn current_plasma_block_number(&self) -> RootChainFuture<'_, u64>;

    /// Commit a block's Merkle root, signed by `operator`.
    fn commit_block_root<'a>(
        &'a self,
        operator: &'a Account,
        root: Digest32,
    ) -> RootChainFuture<'a, CommitReceipt>;

    /// Subscribe to `DepositCreated` events.
    fn watch_deposit_created(&self) -> RootChainFuture<'_, mpsc::UnboundedReceiver<DepositEvent>>;
}
