// HTTP request handlers
// Author: kelexine (https://github.com/kelexine)

use super::routes::AppState;
use crate::error::{DetectorError, Result};
use crate::metrics::gather_metrics;
use crate::models::api::{
    ClearCacheResponse, HealthResponse, RateLimitsInfo, ServiceInfo, StatsResponse,
};
use crate::models::{AnalyzeRequest, AnalyzeResponse};
use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use tracing::{debug, info};

/// Identity used for rate limiting and as the fallback session owner.
///
/// The first `X-Forwarded-For` entry wins so the service works behind a
/// reverse proxy; otherwise the peer address is used.
pub fn client_identity(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match (forwarded, peer) {
        (Some(ip), _) => ip.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => "unknown".to_string(),
    }
}

fn peer_addr(connect_info: Option<ConnectInfo<SocketAddr>>) -> Option<SocketAddr> {
    connect_info.map(|ConnectInfo(addr)| addr)
}

pub async fn root_handler() -> Json<ServiceInfo> {
    let endpoints = [
        ("analyze", "/api/analyze"),
        ("health", "/health"),
        ("stats", "/api/stats"),
        ("cache", "/api/cache"),
        ("metrics", "/metrics"),
    ]
    .into_iter()
    .map(|(name, path)| (name.to_string(), path.to_string()))
    .collect::<BTreeMap<_, _>>();

    Json(ServiceInfo {
        status: "online".to_string(),
        service: "framewatch".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints,
    })
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let orchestrator = &state.orchestrator;

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        api_key_configured: orchestrator.classifier_configured(),
        cache_size: orchestrator.cache().len(),
        rate_limit_tracking: orchestrator.limiter().tracked_identities(),
    })
}

/// Handler for `POST /api/analyze`
pub async fn analyze_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<AnalyzeResponse>> {
    let identity = client_identity(&headers, peer_addr(connect_info));

    // Deserialize by hand so a malformed body is a 400 with a readable message
    let request: AnalyzeRequest = serde_json::from_str(&body).map_err(|e| {
        debug!("Rejected analyze body from {}: {}", identity, e);
        DetectorError::InvalidRequest(format!("JSON deserialization error: {}", e))
    })?;

    debug!(
        "Analyze request from {}: video_url={}, image={} bytes, captions={} chars",
        identity,
        request.video_url,
        request.image.len(),
        request.captions.chars().count()
    );

    let response = state.orchestrator.analyze(&identity, &request).await?;
    Ok(Json(response))
}

pub async fn stats_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Json<StatsResponse> {
    let identity = client_identity(&headers, peer_addr(connect_info));
    let limiter = state.orchestrator.limiter();
    let usage = limiter.usage(&identity);
    let limits = state.config.limits;

    Json(StatsResponse {
        your_ip: identity,
        requests_last_hour: usage.requests_last_hour,
        limit_per_hour: usage.limit_per_hour,
        remaining: usage.remaining,
        cache_entries: state.orchestrator.cache().len(),
        rate_limits: RateLimitsInfo {
            per_minute: limits.per_minute,
            per_hour: limits.per_hour,
        },
        total_tracked_ips: limiter.tracked_identities(),
    })
}

pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    let entries_removed = state.orchestrator.cache().clear();
    info!("Cache cleared via API ({} entries)", entries_removed);

    Json(ClearCacheResponse {
        status: "cache cleared".to_string(),
        entries_removed,
    })
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        gather_metrics(),
    )
}
