//! Prometheus metrics for request tracking.
//!
//! This module provides metrics for:
//! - Diagnostics request latency per endpoint
//! - Request counts per endpoint and status
//! - Authorization failures
//! - Host failures surfaced as 500 responses

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Authorization failures counter metric name.
pub const METRIC_AUTH_FAILURES: &str = "auth_failures_total";
/// Host failures counter metric name.
pub const METRIC_HOST_ERRORS: &str = "host_errors_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "Diagnostics request latency in milliseconds"
    );
    describe_counter!(
        METRIC_HTTP_REQUESTS,
        "Total number of diagnostics requests"
    );
    describe_counter!(
        METRIC_AUTH_FAILURES,
        "Total number of requests rejected by the administrator gate"
    );
    describe_counter!(
        METRIC_HOST_ERRORS,
        "Total number of host failures returned as server errors"
    );

    debug!("Metrics initialized");
}

/// Install the global Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Increment the request counter.
pub fn inc_http_requests(endpoint: &str, status: u16) {
    counter!(
        METRIC_HTTP_REQUESTS,
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Increment authorization failures counter.
pub fn inc_auth_failures(reason: &'static str) {
    counter!(METRIC_AUTH_FAILURES, "reason" => reason).increment(1);
}

/// Increment host failures counter.
pub fn inc_host_errors() {
    counter!(METRIC_HOST_ERRORS).increment(1);
}

/// RAII guard for timing a request.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    endpoint: String,
}

impl LatencyTimer {
    /// Start timing a request to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.into(),
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        record_http_latency(self.start, &self.endpoint);
    }
}
