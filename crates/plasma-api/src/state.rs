//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. Every field is an `Arc`, so cloning per request is
//! cheap. Handlers call the engine synchronously; its lock is released
//! before any `.await` on the root chain.

use std::sync::Arc;

use plasma_chain::ChildChain;
use plasma_crypto::Account;
use plasma_rootchain::RootChain;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The ledger engine.
    pub chain: Arc<ChildChain>,
    /// Operator account signing sealed blocks and root commits.
    pub operator: Arc<Account>,
    /// Root-chain contract.
    pub root_chain: Arc<dyn RootChain>,
}

impl AppState {
    /// Bundle the engine, operator and root chain for the handlers.
    pub fn new(chain: Arc<ChildChain>, operator: Arc<Account>, root_chain: Arc<dyn RootChain>) -> Self {
        Self {
            chain,
            operator,
            root_chain,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("chain", &self.chain)
            .field("operator", &self.operator.address())
            .finish_non_exhaustive()
    }
}
