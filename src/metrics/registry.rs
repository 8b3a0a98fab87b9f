// Prometheus metrics registry and collectors
// Author: kelexine (https://github.com/kelexine)

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec_with_registry, register_gauge_vec_with_registry,
    register_histogram_vec_with_registry, CounterVec, Encoder, GaugeVec, HistogramVec, Opts,
    Registry, TextEncoder,
};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // REQUEST METRICS
    // ============================================================================

    /// Total number of API requests
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("requests_total", "Total number of API requests"),
        &["endpoint", "status_code"],
        REGISTRY
    ).unwrap();

    /// Request duration histogram
    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("request_duration_seconds", "Request duration in seconds")
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["endpoint"],
        REGISTRY
    ).unwrap();

    /// Requests refused by admission control
    pub static ref RATE_LIMITED_TOTAL: CounterVec = register_counter_vec_with_registry!(
        Opts::new("rate_limited_total", "Total requests rejected by the rate limiter"),
        &["endpoint"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // CLASSIFIER METRICS
    // ============================================================================

    /// Total classifier calls by outcome
    pub static ref CLASSIFIER_CALLS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("classifier_calls_total", "Total vision classifier calls"),
        &["outcome"], // outcome: success or an error kind
        REGISTRY
    ).unwrap();

    /// Classifier call duration
    pub static ref CLASSIFIER_DURATION: HistogramVec = register_histogram_vec_with_registry!(
        prometheus::HistogramOpts::new("classifier_duration_seconds", "Vision classifier call duration")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["outcome"],
        REGISTRY
    ).unwrap();

    // ============================================================================
    // STATE METRICS
    // ============================================================================

    /// Cache operations
    pub static ref CACHE_OPERATIONS: CounterVec = register_counter_vec_with_registry!(
        Opts::new("cache_operations_total", "Total verdict cache operations"),
        &["operation"], // operation: hit, miss, expired, store
        REGISTRY
    ).unwrap();

    /// Current entries held by each in-memory store
    pub static ref STORE_ENTRIES: GaugeVec = register_gauge_vec_with_registry!(
        Opts::new("store_entries_current", "Current number of entries per store"),
        &["store"], // store: cache, sessions, rate_limits
        REGISTRY
    ).unwrap();
}

/// Gather all metrics and return as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
