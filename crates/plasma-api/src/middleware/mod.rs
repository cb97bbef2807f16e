//! # HTTP Middleware

pub mod metrics;
