//! Axum-based HTTP server for the framewatch gateway.
//!
//! This module exposes the endpoints the browser extension talks to and
//! hands analyze requests to the [`RequestOrchestrator`](crate::analyze::RequestOrchestrator).
//!
//! # Components
//!
//! - `handlers`: Implementation of individual endpoints (analyze, health, stats, cache, metrics).
//! - `middleware`: Request ID tracking and per-route request metrics.
//! - `routes`: The main router configuration that ties everything together.
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod handlers;
mod middleware;
mod routes;

pub use handlers::client_identity;
pub use routes::{create_router, AppState};
