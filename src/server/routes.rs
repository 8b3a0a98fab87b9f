// HTTP routes configuration
// Author: kelexine (https://github.com/kelexine)

use super::handlers::{
    analyze_handler, clear_cache_handler, health_handler, metrics_handler, root_handler,
    stats_handler,
};
use super::middleware::{request_id_layers, track_metrics};
use crate::analyze::RequestOrchestrator;
use crate::config::AppConfig;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Frames arrive as base64 JPEG; allow generous headroom over Gemini's limit
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub orchestrator: Arc<RequestOrchestrator>,
}

pub fn create_router(config: AppConfig, orchestrator: Arc<RequestOrchestrator>) -> Router {
    let state = AppState {
        config: Arc::new(config),
        orchestrator,
    };

    let (set_request_id, propagate_request_id) = request_id_layers();

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/cache", delete(clear_cache_handler))
        .route("/metrics", get(metrics_handler))
        .route_layer(middleware::from_fn(track_metrics))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        // The extension calls from a chrome-extension:// origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}
