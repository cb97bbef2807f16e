//! # ChildChain — the Ledger Engine
//!
//! One owned aggregate, [`ChainState`], behind one `parking_lot::RwLock`.
//! Mutations take the write lock for their whole duration; reads take the
//! read lock. The lock is never held across `.await`.
//!
//! ## Mutation Protocol
//!
//! Every mutating operation follows the same three steps under the write
//! lock:
//!
//! 1. Validate against the in-memory aggregate without touching it.
//! 2. Stage every persisted effect in one [`WriteBatch`] and commit it.
//! 3. Apply the same effects to the aggregate.
//!
//! A validation failure returns before step 2 and a commit failure returns
//! before step 3, so a rejected operation leaves both memory and storage
//! unchanged.
//!
//! ## Block Numbers
//!
//! The persisted `current_block_number` is always the number of the open
//! block. Sealing the open block or creating a deposit block both take that
//! number and advance the counter by one.
//!
//! ## Pending Transactions
//!
//! Each admitted transaction is persisted under its hash together with a
//! monotonic admission sequence number. Recovery re-admits records in
//! sequence order, so a transaction keeps the index it was given. Records
//! that validate but do not fit the open block under the configured limit
//! wait in a backlog with their inputs spent; sealing moves them into the
//! next open block.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use plasma_core::{
    Address, PlasmaError, PlasmaResult, Position, StoreError, MERKLE_CAPACITY,
};
use plasma_crypto::{Account, Signature};

use crate::block::Block;
use crate::store::{
    decode_counter, decode_mempool_record, encode_counter, encode_mempool_record, keys, KvStore,
    WriteBatch,
};
use crate::tx::{OutputRef, Tx, TxOut};

/// Block number given to the first block of a fresh chain.
pub const DEFAULT_BLOCK_NUMBER: u64 = 1;

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Per-block transaction cap. Clamped to `[1, MERKLE_CAPACITY]`.
    pub max_txes_per_block: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            max_txes_per_block: MERKLE_CAPACITY,
        }
    }
}

impl ChainConfig {
    fn effective_limit(&self) -> usize {
        let limit = self.max_txes_per_block.clamp(1, MERKLE_CAPACITY);
        if limit != self.max_txes_per_block {
            warn!(
                configured = self.max_txes_per_block,
                effective = limit,
                "max_txes_per_block out of range, clamped"
            );
        }
        limit
    }
}

/// The ledger aggregate.
#[derive(Debug)]
struct ChainState {
    open_block: Block,
    sealed: BTreeMap<u64, Block>,
    /// Admitted transactions that did not fit the open block.
    backlog: VecDeque<Tx>,
    next_seq: u64,
}

impl ChainState {
    fn tx(&self, block_number: u64, tx_index: u64) -> Option<&Tx> {
        let index = usize::try_from(tx_index).ok()?;
        self.sealed.get(&block_number)?.tx(index)
    }

    fn tx_out(&self, r: OutputRef) -> Option<&TxOut> {
        self.tx(r.block_number, u64::from(r.tx_index))?
            .outputs()
            .get(usize::from(r.output_index))
    }

    /// Check `tx` against the UTXO set. Returns the outputs it spends.
    fn validate_tx(&self, tx: &Tx) -> PlasmaResult<Vec<OutputRef>> {
        let output_total: u128 = tx.outputs().iter().map(|o| u128::from(o.amount)).sum();
        let mut input_total: u128 = 0;
        let mut spends: Vec<OutputRef> = Vec::with_capacity(tx.inputs().len());

        for (i, input) in tx.inputs().iter().enumerate() {
            if input.is_null() {
                continue;
            }
            let r = input.output_ref();
            let out = self.tx_out(r).ok_or(PlasmaError::InvalidTxIn)?;
            if out.spent || spends.contains(&r) {
                return Err(PlasmaError::TxOutAlreadySpent);
            }
            if tx.signer_address(i)? != out.owner {
                return Err(PlasmaError::InvalidTxSignature);
            }
            input_total += u128::from(out.amount);
            spends.push(r);
        }

        if spends.is_empty() {
            return Err(PlasmaError::InvalidTxIn);
        }
        if input_total < output_total {
            return Err(PlasmaError::InvalidTxBalance);
        }
        Ok(spends)
    }

    fn spend(&mut self, r: OutputRef) -> PlasmaResult<()> {
        self.sealed
            .get_mut(&r.block_number)
            .and_then(|b| b.tx_mut(r.tx_index as usize))
            .ok_or(PlasmaError::InvalidTxIn)?
            .spend_output(usize::from(r.output_index))
    }

    /// Mark every output consumed by the sealed blocks.
    fn replay_spends(&mut self) {
        let refs: Vec<OutputRef> = self
            .sealed
            .values()
            .flat_map(|b| b.txes())
            .flat_map(|tx| tx.inputs())
            .filter(|input| !input.is_null())
            .map(|input| input.output_ref())
            .collect();
        for r in refs {
            if let Err(e) = self.spend(r) {
                warn!(
                    block = r.block_number,
                    tx = r.tx_index,
                    output = r.output_index,
                    error = %e,
                    "sealed input does not resolve cleanly during replay"
                );
            }
        }
    }
}

/// The child-chain ledger engine.
pub struct ChildChain {
    store: Arc<dyn KvStore>,
    max_txes_per_block: usize,
    state: RwLock<ChainState>,
}

impl std::fmt::Debug for ChildChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("ChildChain")
            .field("current_block_number", &state.open_block.number())
            .field("open_block_len", &state.open_block.len())
            .field("sealed_blocks", &state.sealed.len())
            .field("backlog", &state.backlog.len())
            .field("max_txes_per_block", &self.max_txes_per_block)
            .finish()
    }
}

impl ChildChain {
    /// Open the ledger over `store`, recovering any persisted state.
    ///
    /// - Initialises `current_block_number` to 1 on a fresh store.
    /// - Loads every sealed block and replays its inputs to rebuild spent
    ///   flags.
    /// - Re-validates pending mempool records, in admission order, into a
    ///   fresh open block. Records that no longer validate are deleted;
    ///   valid ones beyond the block limit stay persisted in the backlog.
    pub fn open(store: Arc<dyn KvStore>, config: ChainConfig) -> PlasmaResult<Self> {
        let max_txes_per_block = config.effective_limit();

        let current = match store.get(keys::CURRENT_BLOCK_NUMBER)? {
            Some(bytes) => decode_counter(&bytes)?,
            None => {
                let mut batch = WriteBatch::new();
                batch.put(keys::CURRENT_BLOCK_NUMBER, encode_counter(DEFAULT_BLOCK_NUMBER));
                store.commit(batch)?;
                DEFAULT_BLOCK_NUMBER
            }
        };

        let mut sealed = BTreeMap::new();
        for (key, bytes) in store.scan_prefix(keys::BLOCK_PREFIX)? {
            let block = Block::decode(&bytes).map_err(|e| StoreError::Corrupt {
                key: key.clone(),
                reason: e.to_string(),
            })?;
            sealed.insert(block.number(), block);
        }

        let mut state = ChainState {
            open_block: Block::new(Vec::new(), current),
            sealed,
            backlog: VecDeque::new(),
            next_seq: 0,
        };
        state.replay_spends();

        let chain = Self {
            store,
            max_txes_per_block,
            state: RwLock::new(state),
        };
        chain.recover_mempool()?;

        {
            let state = chain.state.read();
            info!(
                current_block_number = state.open_block.number(),
                sealed_blocks = state.sealed.len(),
                pending_txes = state.open_block.len(),
                backlog = state.backlog.len(),
                "child chain opened"
            );
        }
        Ok(chain)
    }

    fn recover_mempool(&self) -> PlasmaResult<()> {
        let mut stale = WriteBatch::new();
        let mut pending: Vec<(u64, String, Tx)> = Vec::new();
        for (key, bytes) in self.store.scan_prefix(keys::MEMPOOL_PREFIX)? {
            let decoded = decode_mempool_record(&key, &bytes)
                .map_err(PlasmaError::from)
                .and_then(|(seq, raw)| Ok((seq, Tx::decode(raw)?)));
            match decoded {
                Ok((seq, tx)) => pending.push((seq, key, tx)),
                Err(e) => {
                    warn!(key = %key, error = %e, "dropping undecodable pending tx");
                    stale.delete(key);
                }
            }
        }
        pending.sort_by_key(|(seq, _, _)| *seq);

        let mut state = self.state.write();
        if let Some((seq, _, _)) = pending.last() {
            state.next_seq = seq + 1;
        }
        for (_, key, tx) in pending {
            let spends = match state.validate_tx(&tx) {
                Ok(spends) => spends,
                Err(e) => {
                    warn!(key = %key, error = %e, "dropping pending tx that no longer validates");
                    stale.delete(key);
                    continue;
                }
            };
            for r in spends {
                state.spend(r)?;
            }
            if state.open_block.len() < self.max_txes_per_block {
                state.open_block.add_tx(tx, self.max_txes_per_block)?;
            } else {
                state.backlog.push_back(tx);
            }
        }

        if !state.backlog.is_empty() {
            warn!(
                backlog = state.backlog.len(),
                limit = self.max_txes_per_block,
                "pending txes exceed the block limit; carried into later blocks"
            );
        }
        if !stale.is_empty() {
            self.store.commit(stale)?;
        }
        Ok(())
    }

    /// Number of the open block.
    pub fn current_block_number(&self) -> u64 {
        self.state.read().open_block.number()
    }

    /// Transactions waiting in the open block.
    pub fn open_block_len(&self) -> usize {
        self.state.read().open_block.len()
    }

    /// Admitted transactions waiting for a block after the open one.
    pub fn backlog_len(&self) -> usize {
        self.state.read().backlog.len()
    }

    /// Effective per-block transaction cap.
    pub fn max_txes_per_block(&self) -> usize {
        self.max_txes_per_block
    }

    /// A sealed block.
    pub fn get_block(&self, block_number: u64) -> PlasmaResult<Block> {
        self.state
            .read()
            .sealed
            .get(&block_number)
            .cloned()
            .ok_or(PlasmaError::BlockNotFound)
    }

    /// The sealed transaction at a transaction position.
    pub fn get_tx(&self, position: Position) -> PlasmaResult<Tx> {
        let (b, t) = position.decode_tx();
        self.state
            .read()
            .tx(b, t)
            .cloned()
            .ok_or(PlasmaError::TxNotFound)
    }

    /// The output at a UTXO position.
    pub fn get_tx_out(&self, position: Position) -> PlasmaResult<TxOut> {
        let (b, t, o) = position.decode_utxo();
        let state = self.state.read();
        let tx = state.tx(b, t).ok_or(PlasmaError::TxNotFound)?;
        tx.output(o as usize).copied()
    }

    /// Merkle membership proof for the sealed transaction at `position`.
    pub fn get_tx_proof(&self, position: Position) -> PlasmaResult<Vec<u8>> {
        let (b, t) = position.decode_tx();
        let state = self.state.read();
        if state.tx(b, t).is_none() {
            return Err(PlasmaError::TxNotFound);
        }
        let block = state.sealed.get(&b).ok_or(PlasmaError::TxNotFound)?;
        block.membership_proof(t as usize)
    }

    /// Validate `tx` and append it to the open block.
    ///
    /// Returns the transaction's position in the open block. The outputs it
    /// spends are marked spent only once the record is persisted.
    pub fn add_tx_to_mempool(&self, tx: Tx) -> PlasmaResult<Position> {
        let mut state = self.state.write();

        let spends = state.validate_tx(&tx)?;
        let tx_index = state.open_block.len();
        if tx_index >= self.max_txes_per_block {
            return Err(PlasmaError::BlockTxesNumExceedsLimit {
                limit: self.max_txes_per_block,
            });
        }
        let position = Position::tx(state.open_block.number(), tx_index as u64)?;
        let hash = tx.hash();
        let seq = state.next_seq;

        let mut batch = WriteBatch::new();
        batch.put(
            keys::mempool(&hash),
            encode_mempool_record(seq, tx.encode().as_bytes()),
        );
        self.store.commit(batch)?;

        state.next_seq = seq + 1;
        for r in spends {
            state.spend(r)?;
        }
        state.open_block.add_tx(tx, self.max_txes_per_block)?;

        info!(%hash, %position, "tx admitted to mempool");
        Ok(position)
    }

    /// Seal the open block with `operator` and open the next one.
    ///
    /// The next open block starts with as much of the backlog as fits.
    pub fn add_block(&self, operator: &Account) -> PlasmaResult<u64> {
        let mut state = self.state.write();

        if state.open_block.is_empty() {
            return Err(PlasmaError::EmptyBlock);
        }
        let mut block = state.open_block.clone();
        block.sign(operator)?;
        let number = block.number();
        let next = number + 1;

        let mut batch = WriteBatch::new();
        batch.put(keys::block(number), block.encode().into_vec());
        for tx in block.txes() {
            batch.delete(keys::mempool(&tx.hash()));
        }
        batch.put(keys::CURRENT_BLOCK_NUMBER, encode_counter(next));
        self.store.commit(batch)?;

        let txes = block.len();
        state.sealed.insert(number, block);
        let carried = state.backlog.len().min(self.max_txes_per_block);
        let carried: Vec<Tx> = state.backlog.drain(..carried).collect();
        state.open_block = Block::new(carried, next);

        info!(
            block = number,
            txes,
            carried = state.open_block.len(),
            "block sealed"
        );
        Ok(number)
    }

    /// Create and seal a single-deposit block at the current block number.
    ///
    /// The open block moves to the next number; positions already handed
    /// out for its transactions shift with it.
    pub fn add_deposit_block(
        &self,
        owner: Address,
        amount: u64,
        operator: &Account,
    ) -> PlasmaResult<u64> {
        let mut state = self.state.write();

        let number = state.open_block.number();
        let next = number + 1;
        let mut block = Block::new(vec![Tx::new_deposit(owner, amount)], number);
        block.sign(operator)?;

        let mut batch = WriteBatch::new();
        batch.put(keys::block(number), block.encode().into_vec());
        batch.put(keys::CURRENT_BLOCK_NUMBER, encode_counter(next));
        self.store.commit(batch)?;

        state.sealed.insert(number, block);
        if !state.open_block.is_empty() {
            warn!(
                from = number,
                to = next,
                pending = state.open_block.len(),
                "deposit renumbered a non-empty open block; pending positions shift"
            );
        }
        state.open_block.set_number(next);

        info!(block = number, %owner, amount, "deposit block created");
        Ok(number)
    }

    /// Attach a confirmation signature to the input at `position`.
    ///
    /// The signature must recover, over the transaction's confirmation
    /// digest, to the owner of the output the input spends.
    pub fn confirm_tx(&self, position: Position, confirmation: Signature) -> PlasmaResult<()> {
        let (b, t, i) = position.decode_input();
        let mut state = self.state.write();

        let tx = state.tx(b, t).ok_or(PlasmaError::TxNotFound)?;
        let input_index = usize::try_from(i).map_err(|_| PlasmaError::InputNotFound)?;
        let input = tx.input(input_index)?;
        if input.is_null() {
            return Err(PlasmaError::NullInputConfirmation);
        }
        let owner = state
            .tx_out(input.output_ref())
            .ok_or(PlasmaError::InvalidTxIn)?
            .owner;
        let signer = confirmation
            .signer_address(&tx.confirmation_digest())
            .map_err(|_| PlasmaError::InvalidTxConfirmationSignature)?;
        if signer != owner {
            return Err(PlasmaError::InvalidTxConfirmationSignature);
        }

        let mut block = state
            .sealed
            .get(&b)
            .cloned()
            .ok_or(PlasmaError::TxNotFound)?;
        block
            .tx_mut(t as usize)
            .ok_or(PlasmaError::TxNotFound)?
            .set_confirmation_signature(input_index, confirmation)?;

        let mut batch = WriteBatch::new();
        batch.put(keys::block(b), block.encode().into_vec());
        self.store.commit(batch)?;

        state.sealed.insert(b, block);
        debug!(%position, "input confirmed");
        Ok(())
    }
}
