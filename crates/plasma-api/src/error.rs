//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps ledger errors from plasma-core and root-chain errors from
//! plasma-rootchain onto HTTP statuses and stable numeric application codes.
//! Server-side failures are logged, and their messages are not returned.
//!
//! ## Code table
//!
//! | Code  | Meaning                              |
//! |-------|--------------------------------------|
//! | 10000 | unexpected error                     |
//! | 10001 | blockchain is not synchronized       |
//! | 10002 | storage unavailable                  |
//! | 11001 | block not found                      |
//! | 11002 | empty block                          |
//! | 11003 | tx not found                         |
//! | 11004 | invalid tx signature                 |
//! | 11005 | invalid tx confirmation signature    |
//! | 11006 | invalid tx balance                   |
//! | 11007 | txin not found                       |
//! | 11008 | invalid txin                         |
//! | 11009 | null txin confirmation               |
//! | 11010 | txout already spent                  |
//! | 12001 | block txes num exceeds limit         |
//! | 20001 | invalid path parameter               |
//! | 20002 | missing or invalid body parameter    |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use plasma_core::{ErrorKind, PlasmaError};
use plasma_rootchain::RootChainError;

/// Unexpected internal failure.
pub const UNEXPECTED: u32 = 10000;
/// Child chain and root chain disagree on the block number.
pub const NOT_SYNCHRONIZED: u32 = 10001;
/// The ledger store failed.
pub const STORAGE_UNAVAILABLE: u32 = 10002;
/// Invalid path parameter.
pub const PATH_PARAM: u32 = 20001;
/// Missing or invalid body parameter.
pub const BODY_PARAM: u32 = 20002;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// The error.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Numeric application code from the table above.
    pub code: u32,
    /// Ledger error kind (e.g. "NOT_FOUND", "STATE_VIOLATION").
    pub kind: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional context, present only for some client errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// A ledger operation was rejected.
    #[error(transparent)]
    Ledger(PlasmaError),

    /// The root chain failed or disagrees with the child chain.
    #[error(transparent)]
    RootChain(RootChainError),

    /// A path segment could not be parsed.
    #[error("'{0}' is invalid")]
    PathParam(&'static str),

    /// A required body field is absent.
    #[error("'{0}' is required")]
    MissingBodyParam(&'static str),

    /// A body field is present but malformed.
    #[error("'{0}' is invalid")]
    InvalidBodyParam(&'static str),

    /// The request body is not valid JSON for the endpoint.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<PlasmaError> for AppError {
    fn from(err: PlasmaError) -> Self {
        Self::Ledger(err)
    }
}

impl From<RootChainError> for AppError {
    fn from(err: RootChainError) -> Self {
        match err {
            RootChainError::Ledger(e) => Self::Ledger(e),
            other => Self::RootChain(other),
        }
    }
}

fn ledger_code(err: &PlasmaError) -> u32 {
    match err {
        PlasmaError::BlockNotFound => 11001,
        PlasmaError::EmptyBlock => 11002,
        PlasmaError::TxNotFound => 11003,
        PlasmaError::InvalidTxSignature => 11004,
        PlasmaError::InvalidTxConfirmationSignature => 11005,
        PlasmaError::InvalidTxBalance => 11006,
        PlasmaError::InputNotFound => 11007,
        PlasmaError::InvalidTxIn => 11008,
        PlasmaError::NullInputConfirmation => 11009,
        PlasmaError::TxOutAlreadySpent => 11010,
        PlasmaError::BlockTxesNumExceedsLimit { .. } => 12001,
        PlasmaError::InvalidPosition(_) => PATH_PARAM,
        PlasmaError::InvalidInputIndex(_)
        | PlasmaError::InvalidOutputIndex(_)
        | PlasmaError::InvalidSignature => BODY_PARAM,
        PlasmaError::Storage(_) => STORAGE_UNAVAILABLE,
        PlasmaError::Codec(_) | PlasmaError::Crypto(_) => UNEXPECTED,
    }
}

fn kind_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::AuthFailure => StatusCode::FORBIDDEN,
        ErrorKind::StateViolation => StatusCode::CONFLICT,
        ErrorKind::StorageFailure => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl AppError {
    /// Return the HTTP status code and numeric application code for this error.
    fn status_and_code(&self) -> (StatusCode, u32) {
        match self {
            Self::Ledger(e) => (kind_status(e.kind()), ledger_code(e)),
            Self::RootChain(RootChainError::NotSynchronized { .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, NOT_SYNCHRONIZED)
            }
            Self::RootChain(RootChainError::Ledger(e)) => (kind_status(e.kind()), ledger_code(e)),
            Self::RootChain(_) => (StatusCode::BAD_GATEWAY, UNEXPECTED),
            Self::PathParam(_) => (StatusCode::BAD_REQUEST, PATH_PARAM),
            Self::MissingBodyParam(_) | Self::InvalidBodyParam(_) | Self::BadRequest(_) => {
                (StatusCode::BAD_REQUEST, BODY_PARAM)
            }
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            Self::Ledger(e) | Self::RootChain(RootChainError::Ledger(e)) => e.kind(),
            Self::RootChain(_) => ErrorKind::Unexpected,
            Self::PathParam(_)
            | Self::MissingBodyParam(_)
            | Self::InvalidBodyParam(_)
            | Self::BadRequest(_) => ErrorKind::InvalidInput,
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Ledger(PlasmaError::BlockTxesNumExceedsLimit { limit }) => {
                Some(serde_json::json!({ "limit": limit }))
            }
            Self::RootChain(RootChainError::NotSynchronized {
                root_chain,
                child_chain,
            }) => Some(serde_json::json!({
                "root_chain": root_chain,
                "child_chain": child_chain,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // 5xx messages may carry store or transport internals.
        let internal = matches!(code, UNEXPECTED | STORAGE_UNAVAILABLE);
        let message = if status.is_server_error() && internal {
            tracing::error!(error = %self, status = status.as_u16(), "internal server error");
            "unexpected error".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                kind: self.kind().as_str().to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}
