//! # Error Types — Closed Ledger Error Taxonomy
//!
//! Defines the error types used throughout the child chain. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Every rejected ledger operation returns a specific [`PlasmaError`]
//!   variant, never a generic failure.
//! - [`PlasmaError::kind()`] is an exhaustive `match`: the request layer maps
//!   kinds onto transport codes without inspecting messages.
//! - Validation errors leave ledger state untouched; storage errors abort the
//!   in-flight mutation and are surfaced as-is.

use thiserror::Error;

/// Coarse classification of ledger errors.
///
/// The request layer maps each kind to one transport status. The mapping
/// must stay total: a new kind is a compile error in every consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A block, transaction or input slot does not exist.
    NotFound,
    /// Malformed position, index out of range, or structurally invalid input.
    InvalidInput,
    /// A signature or confirmation signature did not authenticate.
    AuthFailure,
    /// The operation would break a ledger invariant (double spend, balance
    /// deficit, empty block, block size limit).
    StateViolation,
    /// The transactional store failed to commit or read.
    StorageFailure,
    /// Anything not covered above.
    Unexpected,
}

impl ErrorKind {
    /// Returns the kind identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::InvalidInput => "INVALID_INPUT",
            Self::AuthFailure => "AUTH_FAILURE",
            Self::StateViolation => "STATE_VIOLATION",
            Self::StorageFailure => "STORAGE_FAILURE",
            Self::Unexpected => "UNEXPECTED",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for ledger operations.
#[derive(Error, Debug)]
pub enum PlasmaError {
    /// No sealed block carries the requested number.
    #[error("block not found")]
    BlockNotFound,

    /// The block or the transaction slot does not exist.
    #[error("tx not found")]
    TxNotFound,

    /// The transaction has no input slot at the requested index.
    #[error("txin not found")]
    InputNotFound,

    /// An input index passed to a signing call is out of range.
    #[error("invalid input index: {0}")]
    InvalidInputIndex(usize),

    /// An output index is out of range.
    #[error("invalid output index: {0}")]
    InvalidOutputIndex(usize),

    /// A position component is out of range or the packed value overflows.
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// An input references a missing output, or every input slot is null.
    #[error("invalid txin")]
    InvalidTxIn,

    /// An input signature is null, unrecoverable, or not by the owner.
    #[error("invalid tx signature")]
    InvalidTxSignature,

    /// A confirmation signature does not recover to the spent output's owner.
    #[error("invalid tx confirmation signature")]
    InvalidTxConfirmationSignature,

    /// Signature bytes are null or cannot be recovered.
    #[error("invalid signature")]
    InvalidSignature,

    /// Input total is lower than output total.
    #[error("invalid tx balance")]
    InvalidTxBalance,

    /// The referenced output has already been consumed.
    #[error("txout already spent")]
    TxOutAlreadySpent,

    /// Confirmation was requested for a null input slot.
    #[error("null txin confirmation")]
    NullInputConfirmation,

    /// The open block holds no transactions.
    #[error("empty block")]
    EmptyBlock,

    /// Appending would exceed the per-block transaction limit.
    #[error("block txes num exceeds limit: {limit}")]
    BlockTxesNumExceedsLimit {
        /// The configured per-block limit.
        limit: usize,
    },

    /// The transactional store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// Canonical bytes could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A cryptographic primitive failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
}

impl PlasmaError {
    /// Classify this error into one of the six ledger error kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BlockNotFound | Self::TxNotFound | Self::InputNotFound => ErrorKind::NotFound,
            Self::InvalidInputIndex(_)
            | Self::InvalidOutputIndex(_)
            | Self::InvalidPosition(_)
            | Self::InvalidTxIn
            | Self::NullInputConfirmation => ErrorKind::InvalidInput,
            Self::InvalidTxSignature
            | Self::InvalidTxConfirmationSignature
            | Self::InvalidSignature => ErrorKind::AuthFailure,
            Self::InvalidTxBalance
            | Self::TxOutAlreadySpent
            | Self::EmptyBlock
            | Self::BlockTxesNumExceedsLimit { .. } => ErrorKind::StateViolation,
            Self::Storage(_) => ErrorKind::StorageFailure,
            Self::Codec(_) | Self::Crypto(_) => ErrorKind::Unexpected,
        }
    }
}

/// Error decoding canonical bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The byte stream ended before the value was fully read.
    #[error("unexpected end of data while reading {0}")]
    UnexpectedEof(&'static str),

    /// Bytes remained after the value was fully read.
    #[error("{0} trailing bytes after value")]
    TrailingData(usize),

    /// A field held a value outside its domain.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// The field being decoded.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// Hex text could not be decoded.
    #[error("hex decode error: {0}")]
    Hex(String),
}

/// Error in cryptographic operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Signing failed.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Key generation or parsing failed.
    #[error("key error: {0}")]
    KeyError(String),

    /// Merkle tree construction or proof generation failed.
    #[error("merkle error: {0}")]
    Merkle(String),
}

/// Error from the transactional key/value store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The write batch could not be committed; none of its writes are visible.
    #[error("commit aborted: {0}")]
    CommitAborted(String),

    /// A read failed.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// A stored value was not in the expected format.
    #[error("corrupt value at key {key}: {reason}")]
    Corrupt {
        /// The offending key, rendered for diagnostics.
        key: String,
        /// What was wrong with it.
        reason: String,
    },
}
