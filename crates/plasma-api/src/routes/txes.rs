//! # Transaction Endpoints
//!
//! Transactions travel as the hex of their storage encoding (signed
//! encoding plus confirmation signatures).

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use plasma_chain::Tx;
use plasma_core::{decode_hex, Digest32, Position};
use plasma_crypto::Signature;

use crate::error::AppError;
use crate::extractors::{extract_json, parse_path, required};
use crate::state::AppState;

/// Body of `POST /txes`.
#[derive(Debug, Deserialize)]
pub struct PostTxRequest {
    /// Hex of the transaction's storage encoding, with or without `0x`.
    #[serde(default)]
    pub tx: Option<String>,
}

/// Position assigned to an admitted transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct PostTxResponse {
    /// Position in the open block.
    pub pos: Position,
    /// Transaction hash.
    pub hash: Digest32,
}

/// A transaction in wire form.
#[derive(Debug, Serialize, Deserialize)]
pub struct TxResponse {
    /// `0x`-prefixed hex of the storage encoding.
    pub tx: String,
    /// Transaction hash.
    pub hash: Digest32,
}

/// Membership proof of a sealed transaction against its block root.
#[derive(Debug, Serialize, Deserialize)]
pub struct TxProofResponse {
    /// Merkle root of the containing block.
    pub root: Digest32,
    /// Concatenated sibling hashes, leaf level first, as `0x` hex.
    pub proof: String,
}

/// Body of `PUT /txins/{pos}`.
#[derive(Debug, Deserialize)]
pub struct PutTxInRequest {
    /// Hex confirmation signature by the spent output's owner.
    #[serde(default)]
    pub confsig: Option<String>,
}

/// Transaction and input routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/txes", post(post_tx))
        .route("/txes/{pos}", get(get_tx))
        .route("/txes/{pos}/proof", get(get_tx_proof))
        .route("/txins/{pos}", put(put_txin))
}

fn decode_tx(text: &str) -> Result<Tx, AppError> {
    let bytes = decode_hex(text).map_err(|_| AppError::InvalidBodyParam("tx"))?;
    Tx::decode(&bytes).map_err(|_| AppError::InvalidBodyParam("tx"))
}

fn tx_response(tx: &Tx) -> TxResponse {
    TxResponse {
        tx: tx.encode().to_hex(),
        hash: tx.hash(),
    }
}

/// POST /txes
async fn post_tx(
    State(state): State<AppState>,
    body: Result<Json<PostTxRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PostTxResponse>), AppError> {
    let req = extract_json(body)?;
    let tx = decode_tx(&required(req.tx, "tx")?)?;
    let hash = tx.hash();
    let pos = state.chain.add_tx_to_mempool(tx)?;
    Ok((StatusCode::CREATED, Json(PostTxResponse { pos, hash })))
}

/// GET /txes/{pos}
async fn get_tx(
    State(state): State<AppState>,
    Path(pos): Path<String>,
) -> Result<Json<TxResponse>, AppError> {
    let pos: Position = parse_path(&pos, "pos")?;
    Ok(Json(tx_response(&state.chain.get_tx(pos)?)))
}

/// GET /txes/{pos}/proof
async fn get_tx_proof(
    State(state): State<AppState>,
    Path(pos): Path<String>,
) -> Result<Json<TxProofResponse>, AppError> {
    let pos: Position = parse_path(&pos, "pos")?;
    let proof = state.chain.get_tx_proof(pos)?;
    let (block_number, _) = pos.decode_tx();
    let root = state.chain.get_block(block_number)?.merkle_root()?;
    Ok(Json(TxProofResponse {
        root,
        proof: format!("0x{}", hex::encode(&proof)),
    }))
}

/// PUT /txins/{pos}
async fn put_txin(
    State(state): State<AppState>,
    Path(pos): Path<String>,
    body: Result<Json<PutTxInRequest>, JsonRejection>,
) -> Result<Json<TxResponse>, AppError> {
    let pos: Position = parse_path(&pos, "pos")?;
    let req = extract_json(body)?;
    let confsig = Signature::from_hex(&required(req.confsig, "confsig")?)
        .map_err(|_| AppError::InvalidBodyParam("confsig"))?;
    state.chain.confirm_tx(pos, confsig)?;
    let (block_number, tx_index, _) = pos.decode_input();
    let tx = state.chain.get_tx(Position::tx(block_number, tx_index)?)?;
    Ok(Json(tx_response(&tx)))
}
