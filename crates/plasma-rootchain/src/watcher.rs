//! # Deposit Watcher
//!
//! Turns each `DepositCreated` event into one deposit block. Failures are
//! logged and the event is dropped; there is no retry.
//!
//! Delivery is assumed at-least-once. A redelivered event produces a second
//! deposit block for the same deposit: events carry no key the engine could
//! deduplicate on.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use plasma_chain::ChildChain;
use plasma_core::PlasmaResult;
use plasma_crypto::Account;

use crate::traits::{DepositEvent, RootChain, RootChainError};

/// Consumes deposit events on behalf of the operator.
#[derive(Clone)]
pub struct DepositWatcher {
    chain: Arc<ChildChain>,
    operator: Arc<Account>,
}

impl DepositWatcher {
    /// A watcher that seals deposit blocks into `chain` as `operator`.
    pub fn new(chain: Arc<ChildChain>, operator: Arc<Account>) -> Self {
        Self { chain, operator }
    }

    /// Apply one event. Returns the deposit block number.
    pub fn handle_event(&self, event: &DepositEvent) -> PlasmaResult<u64> {
        let number = self
            .chain
            .add_deposit_block(event.owner, event.amount, &self.operator)?;
        if number != event.deposit_block_number {
            warn!(
                root_chain = event.deposit_block_number,
                child_chain = number,
                "deposit block number differs from root chain"
            );
        }
        Ok(number)
    }

    /// Drain `events` until the sender side closes.
    ///
    /// Only returns once the subscription ends, always with
    /// [`RootChainError::SubscriptionClosed`].
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<DepositEvent>) -> RootChainError {
        while let Some(event) = events.recv().await {
            match self.handle_event(&event) {
                Ok(number) => info!(
                    block = number,
                    owner = %event.owner,
                    amount = event.amount,
                    "deposit block added"
                ),
                Err(e) => error!(
                    error = %e,
                    owner = %event.owner,
                    amount = event.amount,
                    "failed to add deposit block"
                ),
            }
        }
        warn!("deposit subscription ended");
        RootChainError::SubscriptionClosed
    }

    /// Subscribe to `root_chain` and run on a spawned task.
    pub async fn spawn(
        self,
        root_chain: &dyn RootChain,
    ) -> Result<JoinHandle<RootChainError>, RootChainError> {
        let events = root_chain.watch_deposit_created().await?;
        Ok(tokio::spawn(self.run(events)))
    }
}

impl std::fmt::Debug for DepositWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepositWatcher")
            .field("operator", &self.operator.address())
            .finish()
    }
}
