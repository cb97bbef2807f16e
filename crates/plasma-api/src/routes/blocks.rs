//! # Block Endpoints
//!
//! `GET /blocks/{num}` returns a sealed block summary. `POST /blocks` seals
//! the open block and commits its Merkle root to the root chain, or, with
//! `{"type":"deposit","owner":..,"amount":..}`, creates a deposit block.
//!
//! Deposit blocks created here bypass the root-chain contract. They exist
//! for local runs where no contract emits events.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Deserialize;
use tracing::info;

use plasma_chain::BlockSummary;
use plasma_core::Address;
use plasma_rootchain::publish_block_root;

use crate::error::AppError;
use crate::extractors::{extract_optional_json, parse_path, required};
use crate::middleware::metrics::ApiMetrics;
use crate::state::AppState;

/// Body of `POST /blocks`. Absent or empty means "seal the open block".
#[derive(Debug, Default, Deserialize)]
pub struct PostBlockRequest {
    /// `"normal"` (default) or `"deposit"`.
    #[serde(default, rename = "type")]
    pub block_type: Option<String>,
    /// Deposit owner, hex address.
    #[serde(default)]
    pub owner: Option<String>,
    /// Deposit amount.
    #[serde(default)]
    pub amount: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockType {
    Normal,
    Deposit,
}

impl PostBlockRequest {
    fn block_type(&self) -> Result<BlockType, AppError> {
        match self.block_type.as_deref().map(str::trim) {
            None | Some("") | Some("normal") => Ok(BlockType::Normal),
            Some("deposit") => Ok(BlockType::Deposit),
            Some(_) => Err(AppError::InvalidBodyParam("type")),
        }
    }
}

/// Block routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/blocks", post(post_block))
        .route("/blocks/{num}", get(get_block))
}

/// GET /blocks/{num}
async fn get_block(
    State(state): State<AppState>,
    Path(num): Path<String>,
) -> Result<Json<BlockSummary>, AppError> {
    let number: u64 = parse_path(&num, "num")?;
    Ok(Json(state.chain.get_block(number)?.summary()?))
}

/// POST /blocks
async fn post_block(
    State(state): State<AppState>,
    Extension(metrics): Extension<ApiMetrics>,
    body: Bytes,
) -> Result<(StatusCode, Json<BlockSummary>), AppError> {
    let req: PostBlockRequest = extract_optional_json(&body)?;
    let number = match req.block_type()? {
        BlockType::Normal => {
            let number = state.chain.add_block(&state.operator)?;
            metrics.record_block_sealed();
            publish_block_root(
                state.root_chain.as_ref(),
                &state.operator,
                &state.chain,
                number,
            )
            .await?;
            number
        }
        BlockType::Deposit => {
            let owner = required(req.owner.as_deref(), "owner")?;
            let owner = Address::from_hex(owner).map_err(|_| AppError::InvalidBodyParam("owner"))?;
            let amount = required(req.amount, "amount")?;
            let number = state
                .chain
                .add_deposit_block(owner, amount, &state.operator)?;
            metrics.record_deposit_block();
            info!(block = number, %owner, amount, "deposit block created by request");
            number
        }
    };
    let summary = state.chain.get_block(number)?.summary()?;
    Ok((StatusCode::CREATED, Json(summary)))
}
