//! Prometheus metrics for the gateway.
//!
//! Tracks request outcomes, upstream response-head latency, and forward
//! failures per route.

use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    /// Total number of requests handled
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "strait_requests_total",
        "Total number of requests handled by the gateway",
        &["method", "status"]
    )
    .unwrap();

    /// Time until the upstream response head arrived
    pub static ref UPSTREAM_REQUEST_DURATION_MS: HistogramVec = register_histogram_vec!(
        "strait_upstream_request_duration_ms",
        "Duration until the upstream response head arrived, in milliseconds",
        &["route", "status"],
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 15000.0, 60000.0]
    )
    .unwrap();

    /// Forwards that produced no upstream response
    pub static ref FORWARD_FAILURES_TOTAL: CounterVec = register_counter_vec!(
        "strait_forward_failures_total",
        "Total number of upstream forwards that failed",
        &["route", "kind"]  // kind: timeout|network|target
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Helper to record request processing
pub fn record_request(method: &str, status: u16) {
    REQUESTS_TOTAL
        .with_label_values(&[method, &status.to_string()])
        .inc();
}

/// Helper to record upstream response-head latency
pub fn record_upstream_duration(route: &str, status: u16, duration_ms: f64) {
    UPSTREAM_REQUEST_DURATION_MS
        .with_label_values(&[route, &status.to_string()])
        .observe(duration_ms);
}

/// Helper to record a failed forward
pub fn record_forward_failure(route: &str, kind: &str) {
    FORWARD_FAILURES_TOTAL
        .with_label_values(&[route, kind])
        .inc();
}
