//! # Request Metrics
//!
//! In-process counters using atomics. The middleware counts requests and
//! failed responses; block handlers count the blocks they seal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;

/// Shared metrics state.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    requests: Arc<AtomicU64>,
    client_errors: Arc<AtomicU64>,
    server_errors: Arc<AtomicU64>,
    blocks_sealed: Arc<AtomicU64>,
    deposit_blocks: Arc<AtomicU64>,
}

/// Point-in-time copy of [`ApiMetrics`], served at `/metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Requests answered.
    pub requests: u64,
    /// Responses with a 4xx status.
    pub client_errors: u64,
    /// Responses with a 5xx status.
    pub server_errors: u64,
    /// Blocks sealed through `POST /blocks`.
    pub blocks_sealed: u64,
    /// Deposit blocks created through `POST /blocks`.
    pub deposit_blocks: u64,
}

impl ApiMetrics {
    /// Zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests seen so far.
    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    /// Responses with a 4xx or 5xx status.
    pub fn errors(&self) -> u64 {
        self.client_errors.load(Ordering::Relaxed) + self.server_errors.load(Ordering::Relaxed)
    }

    /// Count one sealed block.
    pub fn record_block_sealed(&self) {
        self.blocks_sealed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one deposit block.
    pub fn record_deposit_block(&self) {
        self.deposit_blocks.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests(),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            blocks_sealed: self.blocks_sealed.load(Ordering::Relaxed),
            deposit_blocks: self.deposit_blocks.load(Ordering::Relaxed),
        }
    }
}

/// Middleware that increments request and error counters.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.requests.fetch_add(1, Ordering::Relaxed);
        let status = response.status();
        if status.is_client_error() {
            m.client_errors.fetch_add(1, Ordering::Relaxed);
        } else if status.is_server_error() {
            m.server_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    response
}
