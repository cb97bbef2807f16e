//! # plasma-rootchain — Root-Chain Adapter
//!
//! The thin layer between the ledger engine and the root-chain contract:
//!
//! - [`RootChain`]: the collaborator interface (block number, root commits,
//!   deposit events).
//! - [`MemoryRootChain`]: an in-process contract for tests and local runs.
//! - [`DepositWatcher`]: turns deposit events into deposit blocks.
//! - [`ensure_synchronized`] and [`publish_block_root`]: startup check and
//!   root publication after sealing.
//!
//! ## Crate Policy
//!
//! - No lock is held across an `.await`.
//! - Watcher failures are logged, never retried.

pub mod mock;
pub mod sync;
pub mod traits;
pub mod watcher;

pub use mock::MemoryRootChain;
pub use sync::{ensure_synchronized, publish_block_root};
pub use traits::{CommitReceipt, DepositEvent, RootChain, RootChainError, RootChainFuture};
pub use watcher::DepositWatcher;
