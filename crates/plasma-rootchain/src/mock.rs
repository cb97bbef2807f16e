//! # In-Memory Root Chain
//!
//! Behaves like the root-chain contract as the child chain sees it:
//!
//! - One counter of plasma block numbers, starting at 1.
//! - `deposit()` takes the current number, advances it, and emits a
//!   `DepositCreated` event to every subscriber.
//! - `commit_block_root()` records a root under the current number and
//!   advances it. Only the configured operator may commit.

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use plasma_core::{Address, Digest32};
use plasma_crypto::Account;

use crate::traits::{CommitReceipt, DepositEvent, RootChain, RootChainError, RootChainFuture};

#[derive(Debug)]
struct Contract {
    current_plasma_block_number: u64,
    roots: Vec<(u64, Digest32)>,
    deposits: Vec<DepositEvent>,
    subscribers: Vec<mpsc::UnboundedSender<DepositEvent>>,
}

/// In-memory [`RootChain`].
#[derive(Debug)]
pub struct MemoryRootChain {
    operator: Address,
    contract: Mutex<Contract>,
}

impl MemoryRootChain {
    /// A fresh contract administered by `operator`.
    pub fn new(operator: Address) -> Self {
        Self {
            operator,
            contract: Mutex::new(Contract {
                current_plasma_block_number: 1,
                roots: Vec::new(),
                deposits: Vec::new(),
                subscribers: Vec::new(),
            }),
        }
    }

    /// Deposit `amount` for `owner`, emitting a `DepositCreated` event.
    pub fn deposit(&self, owner: Address, amount: u64) -> DepositEvent {
        let mut c = self.contract.lock();
        let event = DepositEvent {
            owner,
            amount,
            deposit_block_number: c.current_plasma_block_number,
        };
        c.current_plasma_block_number += 1;
        c.deposits.push(event);
        c.subscribers.retain(|tx| tx.send(event).is_ok());
        debug!(block = event.deposit_block_number, %owner, amount, "deposit created");
        event
    }

    /// Re-deliver a past event, as an at-least-once transport may.
    pub fn redeliver(&self, event: DepositEvent) {
        let mut c = self.contract.lock();
        c.subscribers.retain(|tx| tx.send(event).is_ok());
    }

    /// Roots committed so far, with their plasma block numbers.
    pub fn committed_roots(&self) -> Vec<(u64, Digest32)> {
        self.contract.lock().roots.clone()
    }

    /// Deposits made so far.
    pub fn deposits(&self) -> Vec<DepositEvent> {
        self.contract.lock().deposits.clone()
    }
}

impl RootChain for MemoryRootChain {
    fn current_plasma_block_number(&self) -> RootChainFuture<'_, u64> {
        Box::pin(async move { Ok(self.contract.lock().current_plasma_block_number) })
    }

    fn commit_block_root<'a>(
        &'a self,
        operator: &'a Account,
        root: Digest32,
    ) -> RootChainFuture<'a, CommitReceipt> {
        Box::pin(async move {
            if operator.address() != self.operator {
                return Err(RootChainError::Rejected(format!(
                    "{} is not the operator",
                    operator.address()
                )));
            }
            let mut c = self.contract.lock();
            let number = c.current_plasma_block_number;
            c.roots.push((number, root));
            c.current_plasma_block_number += 1;
            Ok(CommitReceipt {
                plasma_block_number: number,
                root,
            })
        })
    }

    fn watch_deposit_created(&self) -> RootChainFuture<'_, mpsc::UnboundedReceiver<DepositEvent>> {
        Box::pin(async move {
            let (tx, rx) = mpsc::unbounded_channel();
            self.contract.lock().subscribers.push(tx);
            Ok(rx)
        })
    }
}
