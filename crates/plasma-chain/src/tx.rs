//! # Transactions — Fixed-Slot UTXO Records
//!
//! A [`Tx`] has exactly [`TX_INPUTS`] input slots and [`TX_OUTPUTS`] output
//! slots. Unused slots hold the null input or the null output.
//!
//! ## Encodings
//!
//! | Name | Bytes | Used for |
//! |---|---|---|
//! | core | inputs' `(u64 block, u32 tx, u8 out)` then outputs' `(owner, u64 amount)` | [`Tx::hash()`] |
//! | signed | core, then each input's signature | Merkle leaf, block hash |
//! | storage | signed, then each input's confirmation signature | persistence, wire |
//!
//! The signing hash excludes signatures because every input signature is
//! computed over it. Confirmation signatures are attached after sealing and
//! are excluded from the Merkle leaf so they never move a committed root.
//!
//! `spent` flags are ledger state, not transaction data: they appear in no
//! encoding and are rebuilt by replaying inputs.

use serde::{Deserialize, Serialize};

use plasma_core::{
    sha256_digest, sha256_tagged, Address, Canonical, CanonicalBytes, CanonicalReader,
    CanonicalWriter, CodecError, Digest32, PlasmaError, PlasmaResult, Position, TX_INPUTS,
    TX_OUTPUTS,
};
use plasma_crypto::{Account, Signature};

/// Domain tag for the confirmation digest.
pub const CONFIRMATION_TAG: &[u8] = b"plasma-confirmation";

/// Reference to one output of a sealed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutputRef {
    /// Block holding the transaction.
    pub block_number: u64,
    /// Index of the transaction in that block.
    pub tx_index: u32,
    /// Output slot.
    pub output_index: u8,
}

impl OutputRef {
    /// The packed UTXO position of this output.
    pub fn position(&self) -> PlasmaResult<Position> {
        Position::utxo(
            self.block_number,
            u64::from(self.tx_index),
            u64::from(self.output_index),
        )
    }
}

// ---------------------------------------------------------------------------
// TxIn
// ---------------------------------------------------------------------------

/// An input slot: a reference to the output it spends plus its signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxIn {
    /// Block of the spent output.
    pub block_number: u64,
    /// Transaction index of the spent output.
    pub tx_index: u32,
    /// Output slot of the spent output.
    pub output_index: u8,
    /// Owner's signature over [`Tx::hash()`].
    pub signature: Signature,
    /// Owner's signature over [`Tx::confirmation_digest()`].
    pub confirmation_signature: Signature,
}

impl TxIn {
    /// An unsigned input spending `(block_number, tx_index, output_index)`.
    pub fn new(block_number: u64, tx_index: u32, output_index: u8) -> Self {
        Self {
            block_number,
            tx_index,
            output_index,
            signature: Signature::NULL,
            confirmation_signature: Signature::NULL,
        }
    }

    /// The null input: funds nothing.
    pub fn null() -> Self {
        Self::default()
    }

    /// Whether every coordinate is zero.
    pub fn is_null(&self) -> bool {
        self.block_number == 0 && self.tx_index == 0 && self.output_index == 0
    }

    /// The output this input spends.
    pub fn output_ref(&self) -> OutputRef {
        OutputRef {
            block_number: self.block_number,
            tx_index: self.tx_index,
            output_index: self.output_index,
        }
    }

    fn write_core(&self, w: &mut CanonicalWriter) {
        w.put_u64(self.block_number);
        w.put_u32(self.tx_index);
        w.put_u8(self.output_index);
    }
}

// ---------------------------------------------------------------------------
// TxOut
// ---------------------------------------------------------------------------

/// An output slot: value assigned to an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxOut {
    /// Owner allowed to spend this output.
    pub owner: Address,
    /// Value carried.
    pub amount: u64,
    /// Set once, when a later transaction consumes this output.
    #[serde(default)]
    pub spent: bool,
}

impl TxOut {
    /// An unspent output.
    pub fn new(owner: Address, amount: u64) -> Self {
        Self {
            owner,
            amount,
            spent: false,
        }
    }

    /// The empty output used to pad unused slots.
    pub fn null() -> Self {
        Self::default()
    }

    /// Whether this is the empty output.
    pub fn is_null(&self) -> bool {
        self.owner.is_null() && self.amount == 0
    }

    fn write_core(&self, w: &mut CanonicalWriter) {
        w.put(&self.owner);
        w.put_u64(self.amount);
    }
}

// ---------------------------------------------------------------------------
// Tx
// ---------------------------------------------------------------------------

/// A transaction with fixed input and output cardinality.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tx {
    inputs: [TxIn; TX_INPUTS],
    outputs: [TxOut; TX_OUTPUTS],
}

impl Tx {
    /// Build a transaction from its slots.
    pub fn new(inputs: [TxIn; TX_INPUTS], outputs: [TxOut; TX_OUTPUTS]) -> Self {
        Self { inputs, outputs }
    }

    /// A deposit: all inputs null, one output of `amount` to `owner` at slot 0.
    pub fn new_deposit(owner: Address, amount: u64) -> Self {
        let mut tx = Self::default();
        tx.outputs[0] = TxOut::new(owner, amount);
        tx
    }

    /// Input slots.
    pub fn inputs(&self) -> &[TxIn; TX_INPUTS] {
        &self.inputs
    }

    /// Output slots.
    pub fn outputs(&self) -> &[TxOut; TX_OUTPUTS] {
        &self.outputs
    }

    /// The input at `index`, or [`PlasmaError::InputNotFound`].
    pub fn input(&self, index: usize) -> PlasmaResult<&TxIn> {
        self.inputs.get(index).ok_or(PlasmaError::InputNotFound)
    }

    /// The output at `index`, or [`PlasmaError::InvalidOutputIndex`].
    pub fn output(&self, index: usize) -> PlasmaResult<&TxOut> {
        self.outputs
            .get(index)
            .ok_or(PlasmaError::InvalidOutputIndex(index))
    }

    /// Replace the output at `index`.
    pub fn set_output(&mut self, index: usize, out: TxOut) -> PlasmaResult<()> {
        let slot = self
            .outputs
            .get_mut(index)
            .ok_or(PlasmaError::InvalidOutputIndex(index))?;
        *slot = out;
        Ok(())
    }

    /// Whether every input slot is null.
    pub fn is_deposit(&self) -> bool {
        self.inputs.iter().all(TxIn::is_null)
    }

    /// SHA-256 of the core encoding. This is the digest inputs sign.
    pub fn hash(&self) -> Digest32 {
        sha256_digest(&CanonicalBytes::new(&CoreView(self)))
    }

    /// The message an input's owner signs to confirm this transaction.
    pub fn confirmation_digest(&self) -> Digest32 {
        sha256_tagged(CONFIRMATION_TAG, &CanonicalBytes::new(&self.hash()))
    }

    /// Sign input `index` with `account`.
    pub fn sign(&mut self, index: usize, account: &Account) -> PlasmaResult<()> {
        if index >= TX_INPUTS {
            return Err(PlasmaError::InvalidInputIndex(index));
        }
        let sig = account.sign(&self.hash())?;
        self.inputs[index].signature = sig;
        Ok(())
    }

    /// Recover the signer of input `index`.
    ///
    /// A null slot signature or a failed recovery is
    /// [`PlasmaError::InvalidTxSignature`].
    pub fn signer_address(&self, index: usize) -> PlasmaResult<Address> {
        let input = self
            .inputs
            .get(index)
            .ok_or(PlasmaError::InvalidInputIndex(index))?;
        input
            .signature
            .signer_address(&self.hash())
            .map_err(|_| PlasmaError::InvalidTxSignature)
    }

    /// One signer per input slot; the null address for null inputs.
    pub fn signers(&self) -> PlasmaResult<[Address; TX_INPUTS]> {
        let mut out = [Address::NULL; TX_INPUTS];
        for (i, input) in self.inputs.iter().enumerate() {
            if !input.is_null() {
                out[i] = self.signer_address(i)?;
            }
        }
        Ok(out)
    }

    /// Mark output `index` spent. Spending twice is an error.
    pub fn spend_output(&mut self, index: usize) -> PlasmaResult<()> {
        let out = self
            .outputs
            .get_mut(index)
            .ok_or(PlasmaError::InvalidOutputIndex(index))?;
        if out.spent {
            return Err(PlasmaError::TxOutAlreadySpent);
        }
        out.spent = true;
        Ok(())
    }

    /// Attach a confirmation signature to input `index`.
    pub fn set_confirmation_signature(&mut self, index: usize, sig: Signature) -> PlasmaResult<()> {
        let input = self
            .inputs
            .get_mut(index)
            .ok_or(PlasmaError::InputNotFound)?;
        if input.is_null() {
            return Err(PlasmaError::NullInputConfirmation);
        }
        input.confirmation_signature = sig;
        Ok(())
    }

    /// Merkle leaf bytes: the signed encoding.
    pub fn merkle_leaf(&self) -> CanonicalBytes {
        CanonicalBytes::new(&SignedView(self))
    }

    /// Storage encoding, including confirmation signatures.
    pub fn encode(&self) -> CanonicalBytes {
        CanonicalBytes::new(self)
    }

    /// Decode a storage encoding. Trailing bytes are rejected.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = CanonicalReader::new(bytes);
        let tx = Self::read(&mut r)?;
        r.finish()?;
        Ok(tx)
    }

    pub(crate) fn write_core(&self, w: &mut CanonicalWriter) {
        for input in &self.inputs {
            input.write_core(w);
        }
        for out in &self.outputs {
            out.write_core(w);
        }
    }

    pub(crate) fn write_signed(&self, w: &mut CanonicalWriter) {
        self.write_core(w);
        for input in &self.inputs {
            w.put(&input.signature);
        }
    }

    pub(crate) fn read(r: &mut CanonicalReader<'_>) -> Result<Self, CodecError> {
        let mut tx = Self::default();
        for input in tx.inputs.iter_mut() {
            input.block_number = r.u64("txin.block_number")?;
            input.tx_index = r.u32("txin.tx_index")?;
            input.output_index = r.u8("txin.output_index")?;
        }
        for out in tx.outputs.iter_mut() {
            out.owner = Address(r.array("txout.owner")?);
            out.amount = r.u64("txout.amount")?;
        }
        for input in tx.inputs.iter_mut() {
            input.signature = Signature(r.array("txin.signature")?);
        }
        for input in tx.inputs.iter_mut() {
            input.confirmation_signature = Signature(r.array("txin.confirmation_signature")?);
        }
        Ok(tx)
    }
}

impl Canonical for Tx {
    fn write_canonical(&self, w: &mut CanonicalWriter) {
        self.write_signed(w);
        for input in &self.inputs {
            w.put(&input.confirmation_signature);
        }
    }
}

struct CoreView<'a>(&'a Tx);

impl Canonical for CoreView<'_> {
    fn write_canonical(&self, w: &mut CanonicalWriter) {
        self.0.write_core(w);
    }
}

struct SignedView<'a>(&'a Tx);

impl Canonical for SignedView<'_> {
    fn write_canonical(&self, w: &mut CanonicalWriter) {
        self.0.write_signed(w);
    }
}
