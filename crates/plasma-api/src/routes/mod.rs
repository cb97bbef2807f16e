//! # API Route Modules
//!
//! - `blocks`: sealed block lookup, sealing, and operator-initiated deposits.
//! - `txes`: mempool submission, tx and proof lookup, input confirmation.

pub mod blocks;
pub mod txes;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// All ledger routes plus `/ping`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .merge(blocks::router())
        .merge(txes::router())
}

async fn ping() -> &'static str {
    "pong"
}
