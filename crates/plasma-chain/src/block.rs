//! # Blocks
//!
//! An ordered batch of transactions under one block number, signed once by
//! the operator.
//!
//! - `hash(block)` = SHA-256(`u32 count || signed tx encodings || u64 number`).
//! - `merkle_root(block)` = root of the depth-[`MERKLE_DEPTH`] tree over each
//!   transaction's [`Tx::merkle_leaf()`]. An empty block has the tree's
//!   empty root.
//! - Storage adds the operator signature and the confirmation signatures:
//!   `u64 number || sig || u32 count || tx storage encodings`.

use serde::Serialize;

use plasma_core::{
    sha256_digest, Address, Canonical, CanonicalBytes, CanonicalReader, CanonicalWriter,
    CodecError, Digest32, PlasmaError, PlasmaResult, MERKLE_DEPTH,
};
use plasma_crypto::{Account, FixedMerkleTree, Signature};

use crate::tx::Tx;

/// A batch of transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    txes: Vec<Tx>,
    number: u64,
    signature: Signature,
}

/// The JSON-facing view of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockSummary {
    /// Transaction hashes in block order.
    pub txes: Vec<Digest32>,
    /// Block number.
    pub num: u64,
    /// Operator signature; null while the block is open.
    pub sig: Signature,
    /// Merkle root over the transactions.
    pub root: Digest32,
}

impl Block {
    /// A new unsigned block.
    pub fn new(txes: Vec<Tx>, number: u64) -> Self {
        Self {
            txes,
            number,
            signature: Signature::NULL,
        }
    }

    /// Block number.
    pub fn number(&self) -> u64 {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: u64) {
        self.number = number;
    }

    /// Transactions in order.
    pub fn txes(&self) -> &[Tx] {
        &self.txes
    }

    /// The transaction at `index`, if any.
    pub fn tx(&self, index: usize) -> Option<&Tx> {
        self.txes.get(index)
    }

    pub(crate) fn tx_mut(&mut self, index: usize) -> Option<&mut Tx> {
        self.txes.get_mut(index)
    }

    /// Number of transactions.
    pub fn len(&self) -> usize {
        self.txes.len()
    }

    /// Whether the block holds no transactions.
    pub fn is_empty(&self) -> bool {
        self.txes.is_empty()
    }

    /// The operator signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Whether the block carries an operator signature.
    pub fn is_sealed(&self) -> bool {
        !self.signature.is_null()
    }

    /// Append `tx`, refusing to grow past `limit` transactions.
    pub fn add_tx(&mut self, tx: Tx, limit: usize) -> PlasmaResult<()> {
        if self.txes.len() >= limit {
            return Err(PlasmaError::BlockTxesNumExceedsLimit { limit });
        }
        self.txes.push(tx);
        Ok(())
    }

    /// SHA-256 of the canonical block encoding.
    pub fn hash(&self) -> Digest32 {
        sha256_digest(&CanonicalBytes::new(self))
    }

    /// Build the transaction Merkle tree.
    pub fn merkle_tree(&self) -> PlasmaResult<FixedMerkleTree> {
        let leaves: Vec<CanonicalBytes> = self.txes.iter().map(Tx::merkle_leaf).collect();
        Ok(FixedMerkleTree::new(MERKLE_DEPTH, &leaves)?)
    }

    /// Root of the transaction Merkle tree.
    pub fn merkle_root(&self) -> PlasmaResult<Digest32> {
        Ok(self.merkle_tree()?.root())
    }

    /// Membership proof for the transaction at `tx_index`.
    pub fn membership_proof(&self, tx_index: usize) -> PlasmaResult<Vec<u8>> {
        if tx_index >= self.txes.len() {
            return Err(PlasmaError::TxNotFound);
        }
        Ok(self.merkle_tree()?.membership_proof(tx_index)?)
    }

    /// Sign the block hash with `operator`.
    pub fn sign(&mut self, operator: &Account) -> PlasmaResult<()> {
        self.signature = operator.sign(&self.hash())?;
        Ok(())
    }

    /// The operator address, or the null address for an unsigned block.
    pub fn signer_address(&self) -> PlasmaResult<Address> {
        if self.signature.is_null() {
            return Ok(Address::NULL);
        }
        self.signature.signer_address(&self.hash())
    }

    /// Hashes, number, signature and root.
    pub fn summary(&self) -> PlasmaResult<BlockSummary> {
        Ok(BlockSummary {
            txes: self.txes.iter().map(Tx::hash).collect(),
            num: self.number,
            sig: self.signature,
            root: self.merkle_root()?,
        })
    }

    /// Storage encoding.
    pub fn encode(&self) -> CanonicalBytes {
        CanonicalBytes::new(&StorageView(self))
    }

    /// Decode a storage encoding.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = CanonicalReader::new(bytes);
        let number = r.u64("block.number")?;
        let signature = Signature(r.array("block.signature")?);
        let count = r.u32("block.tx_count")? as usize;
        let mut txes = Vec::with_capacity(count.min(r.remaining()));
        for _ in 0..count {
            txes.push(Tx::read(&mut r)?);
        }
        r.finish()?;
        Ok(Self {
            txes,
            number,
            signature,
        })
    }
}

fn tx_count(txes: &[Tx]) -> u32 {
    // Block size is capped far below u32::MAX by the engine.
    u32::try_from(txes.len()).unwrap_or(u32::MAX)
}

impl Canonical for Block {
    fn write_canonical(&self, w: &mut CanonicalWriter) {
        w.put_u32(tx_count(&self.txes));
        for tx in &self.txes {
            tx.write_signed(w);
        }
        w.put_u64(self.number);
    }
}

struct StorageView<'a>(&'a Block);

impl Canonical for StorageView<'_> {
    fn write_canonical(&self, w: &mut CanonicalWriter) {
        w.put_u64(self.0.number);
        w.put(&self.0.signature);
        w.put_u32(tx_count(&self.0.txes));
        for tx in &self.0.txes {
            w.put(tx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{TxIn, TxOut};
    use plasma_crypto::verify_membership;

    fn deposit(b: u8) -> Tx {
        Tx::new_deposit(Address([b; 20]), u64::from(b) * 10)
    }

    #[test]
    fn add_tx_enforces_limit() {
        let mut blk = Block::new(Vec::new(), 1);
        blk.add_tx(deposit(1), 2).unwrap();
        blk.add_tx(deposit(2), 2).unwrap();
        assert!(matches!(
            blk.add_tx(deposit(3), 2),
            Err(PlasmaError::BlockTxesNumExceedsLimit { limit: 2 })
        ));
        assert_eq!(blk.len(), 2);
    }

    #[test]
    fn hash_depends_on_number_and_order() {
        let a = Block::new(vec![deposit(1), deposit(2)], 1);
        let b = Block::new(vec![deposit(2), deposit(1)], 1);
        let c = Block::new(vec![deposit(1), deposit(2)], 2);
        assert_eq!(a.hash(), a.clone().hash());
        assert_ne!(a.hash(), b.hash());
        assert_ne!(a.hash(), c.hash());
    }

    #[test]
    fn empty_block_root_is_tree_empty_root() {
        let blk = Block::new(Vec::new(), 1);
        let root = blk.merkle_root().unwrap();
        assert_eq!(root, plasma_crypto::merkle::zero_hashes(MERKLE_DEPTH)[MERKLE_DEPTH]);
        assert!(matches!(
            blk.membership_proof(0),
            Err(PlasmaError::TxNotFound)
        ));
    }

    #[test]
    fn proofs_verify_against_root() {
        let blk = Block::new(vec![deposit(1), deposit(2), deposit(3)], 4);
        let root = blk.merkle_root().unwrap();
        for (i, tx) in blk.txes().iter().enumerate() {
            let proof = blk.membership_proof(i).unwrap();
            assert!(verify_membership(&root, &tx.merkle_leaf(), i, &proof));
        }
    }

    #[test]
    fn sign_and_recover_operator() {
        let op = Account::generate();
        let mut blk = Block::new(vec![deposit(1)], 1);
        assert_eq!(blk.signer_address().unwrap(), Address::NULL);
        assert!(!blk.is_sealed());
        blk.sign(&op).unwrap();
        assert!(blk.is_sealed());
        assert_eq!(blk.signer_address().unwrap(), op.address());
    }

    #[test]
    fn summary_lists_hashes() {
        let blk = Block::new(vec![deposit(1), deposit(2)], 9);
        let s = blk.summary().unwrap();
        assert_eq!(s.num, 9);
        assert_eq!(s.txes, vec![deposit(1).hash(), deposit(2).hash()]);
        assert_eq!(s.root, blk.merkle_root().unwrap());
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["num"], 9);
        assert!(json["sig"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn storage_roundtrip() {
        let op = Account::generate();
        let owner = Account::generate();
        let mut spend = Tx::new(
            [TxIn::new(1, 0, 0), TxIn::null()],
            [TxOut::new(Address([7; 20]), 3), TxOut::null()],
        );
        spend.sign(0, &owner).unwrap();
        let mut blk = Block::new(vec![deposit(1), spend], 2);
        blk.sign(&op).unwrap();
        let back = Block::decode(blk.encode().as_bytes()).unwrap();
        assert_eq!(back, blk);
        assert_eq!(back.signer_address().unwrap(), op.address());
    }

    #[test]
    fn decode_rejects_short_count() {
        let blk = Block::new(vec![deposit(1)], 1);
        let mut bytes = blk.encode().into_vec();
        // Claim two transactions while carrying one.
        bytes[8 + 65 + 3] = 2;
        assert!(matches!(
            Block::decode(&bytes),
            Err(CodecError::UnexpectedEof(_))
        ));
    }
}
