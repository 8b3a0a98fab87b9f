// Metrics module for Prometheus observability
// Author: kelexine (https://github.com/kelexine)

mod registry;

pub use registry::{
    gather_metrics,
    CACHE_OPERATIONS,
    CLASSIFIER_CALLS,
    CLASSIFIER_DURATION,
    RATE_LIMITED_TOTAL,
    REQUESTS_TOTAL,
    REQUEST_DURATION,
    STORE_ENTRIES,
};

/// Helper to record request metrics
pub fn record_request(endpoint: &str, status_code: u16, duration_secs: f64) {
    REQUESTS_TOTAL
        .with_label_values(&[endpoint, &status_code.to_string()])
        .inc();

    REQUEST_DURATION
        .with_label_values(&[endpoint])
        .observe(duration_secs);
}

/// Helper to record a rejected admission
pub fn record_rate_limited(endpoint: &str) {
    RATE_LIMITED_TOTAL.with_label_values(&[endpoint]).inc();
}

/// Helper to record classifier call metrics
pub fn record_classifier_call(outcome: &str, duration_secs: f64) {
    CLASSIFIER_CALLS.with_label_values(&[outcome]).inc();
    CLASSIFIER_DURATION
        .with_label_values(&[outcome])
        .observe(duration_secs);
}

/// Helper to record cache operations (hit, miss, expired, store)
pub fn record_cache_operation(operation: &str) {
    CACHE_OPERATIONS.with_label_values(&[operation]).inc();
}

pub fn update_cache_entries(count: usize) {
    update_store_entries("cache", count);
}

pub fn update_store_entries(store: &str, count: usize) {
    STORE_ENTRIES.with_label_values(&[store]).set(count as f64);
}
