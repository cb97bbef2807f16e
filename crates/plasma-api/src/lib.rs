//! # plasma-api — HTTP Request Layer for the Child Chain
//!
//! A thin axum layer over [`plasma_chain::ChildChain`]. Handlers decode
//! requests, call one engine operation, and map [`plasma_core::PlasmaError`]
//! onto HTTP statuses and numeric codes through [`error::AppError`].
//!
//! ## API Surface
//!
//! | Route                     | Method | Operation                         |
//! |---------------------------|--------|-----------------------------------|
//! | `/ping`                   | GET    | liveness for clients              |
//! | `/blocks/{num}`           | GET    | sealed block summary              |
//! | `/blocks`                 | POST   | seal open block / deposit block   |
//! | `/txes`                   | POST   | submit tx to the mempool          |
//! | `/txes/{pos}`             | GET    | tx lookup                         |
//! | `/txes/{pos}/proof`       | GET    | Merkle membership proof           |
//! | `/txins/{pos}`            | PUT    | attach confirmation signature     |
//! | `/metrics`                | GET    | request and block counters        |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::routing::get;
use axum::{Extension, Json, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::metrics::{ApiMetrics, MetricsSnapshot};
use crate::state::AppState;

/// Assemble the application router with fresh metrics.
pub fn app(state: AppState) -> Router {
    app_with_metrics(state, ApiMetrics::new())
}

/// Assemble the application router, recording into `metrics`.
///
/// Health probes (`/health/*`) sit outside the metrics middleware.
pub fn app_with_metrics(state: AppState, metrics: ApiMetrics) -> Router {
    let api = routes::router()
        .route("/metrics", get(metrics_snapshot))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(metrics))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new().merge(health).merge(api)
}

async fn metrics_snapshot(Extension(metrics): Extension<ApiMetrics>) -> Json<MetricsSnapshot> {
    Json(metrics.snapshot())
}

/// Liveness probe.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe.
async fn readiness() -> &'static str {
    "ready"
}
