//! # Position — Arithmetic UTXO Coordinates
//!
//! A [`Position`] packs `(block_number, tx_index, index)` into one integer:
//!
//! ```text
//! position = block_number * 1_000_000_000 + tx_index * 10_000 + index
//! ```
//!
//! `index` is an output index for UTXO positions and an input index for
//! input positions; the packing is the same. A transaction's own position is
//! the one with `index = 0`.
//!
//! The root-chain verifier decodes positions with integer div/mod only, so
//! the packing is multiplication and addition, never bit masking.
//!
//! ## Invariant
//!
//! `decode(encode(b, t, i)) == (b, t, i)` whenever `t < MAX_TX_PER_BLOCK` and
//! `i < MAX_INDEX`. Encoders reject anything else with
//! [`PlasmaError::InvalidPosition`].

use serde::{Deserialize, Serialize};

use crate::error::PlasmaError;

/// Multiplier for the block number component.
pub const BLOCK_OFFSET: u64 = 1_000_000_000;

/// Multiplier for the transaction index component.
pub const TX_OFFSET: u64 = 10_000;

/// Exclusive upper bound on transaction indices.
pub const MAX_TX_PER_BLOCK: u64 = BLOCK_OFFSET / TX_OFFSET;

/// Exclusive upper bound on input and output indices.
pub const MAX_INDEX: u64 = TX_OFFSET;

/// A packed UTXO, input, or transaction position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(u64);

impl Position {
    /// "No position". Block numbers start at 1, so 0 never names a slot.
    pub const NULL: Self = Self(0);

    /// Wrap an already-packed value.
    pub fn from_u64(v: u64) -> Self {
        Self(v)
    }

    /// The packed integer.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Whether this is the null position.
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Encode a UTXO position `(block_number, tx_index, output_index)`.
    pub fn utxo(block_number: u64, tx_index: u64, output_index: u64) -> Result<Self, PlasmaError> {
        Self::pack(block_number, tx_index, output_index)
    }

    /// Encode an input position `(block_number, tx_index, input_index)`.
    pub fn input(block_number: u64, tx_index: u64, input_index: u64) -> Result<Self, PlasmaError> {
        Self::pack(block_number, tx_index, input_index)
    }

    /// Encode a transaction position `(block_number, tx_index)`.
    pub fn tx(block_number: u64, tx_index: u64) -> Result<Self, PlasmaError> {
        Self::pack(block_number, tx_index, 0)
    }

    /// Decode a UTXO position into `(block_number, tx_index, output_index)`.
    pub fn decode_utxo(&self) -> (u64, u64, u64) {
        self.unpack()
    }

    /// Decode an input position into `(block_number, tx_index, input_index)`.
    pub fn decode_input(&self) -> (u64, u64, u64) {
        self.unpack()
    }

    /// Decode the transaction coordinates `(block_number, tx_index)`,
    /// ignoring the slot index.
    pub fn decode_tx(&self) -> (u64, u64) {
        let (b, t, _) = self.unpack();
        (b, t)
    }

    fn pack(block_number: u64, tx_index: u64, index: u64) -> Result<Self, PlasmaError> {
        if tx_index >= MAX_TX_PER_BLOCK {
            return Err(PlasmaError::InvalidPosition(format!(
                "tx index {tx_index} must be below {MAX_TX_PER_BLOCK}"
            )));
        }
        if index >= MAX_INDEX {
            return Err(PlasmaError::InvalidPosition(format!(
                "slot index {index} must be below {MAX_INDEX}"
            )));
        }
        block_number
            .checked_mul(BLOCK_OFFSET)
            .and_then(|v| v.checked_add(tx_index * TX_OFFSET + index))
            .map(Self)
            .ok_or_else(|| {
                PlasmaError::InvalidPosition(format!("block number {block_number} overflows"))
            })
    }

    fn unpack(&self) -> (u64, u64, u64) {
        let block_number = self.0 / BLOCK_OFFSET;
        let tx_index = (self.0 % BLOCK_OFFSET) / TX_OFFSET;
        let index = self.0 % TX_OFFSET;
        (block_number, tx_index, index)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Position {
    type Err = PlasmaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|e| PlasmaError::InvalidPosition(format!("{s:?}: {e}")))
    }
}
