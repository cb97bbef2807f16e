//! # Synchronisation and Root Publication

use tracing::info;

use plasma_chain::ChildChain;
use plasma_crypto::Account;

use crate::traits::{CommitReceipt, RootChain, RootChainError};

/// Fail with [`RootChainError::NotSynchronized`] unless both chains agree on
/// the current block number.
pub async fn ensure_synchronized(
    root_chain: &dyn RootChain,
    chain: &ChildChain,
) -> Result<(), RootChainError> {
    let root = root_chain.current_plasma_block_number().await?;
    let child = chain.current_block_number();
    if root != child {
        return Err(RootChainError::NotSynchronized {
            root_chain: root,
            child_chain: child,
        });
    }
    Ok(())
}

/// Commit the Merkle root of sealed block `block_number`.
pub async fn publish_block_root(
    root_chain: &dyn RootChain,
    operator: &Account,
    chain: &ChildChain,
    block_number: u64,
) -> Result<CommitReceipt, RootChainError> {
    let root = chain.get_block(block_number)?.merkle_root()?;
    let receipt = root_chain.commit_block_root(operator, root).await?;
    info!(
        block = block_number,
        plasma_block_number = receipt.plasma_block_number,
        %root,
        "block root committed"
    );
    Ok(receipt)
}
