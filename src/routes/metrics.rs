//! Prometheus metrics endpoint
//!
//! Exposes application metrics in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

/// Register all custom metrics
fn register_metrics() {
    metrics::describe_counter!(
        "courier_requests_total",
        "Total number of requests processed per route"
    );
    metrics::describe_histogram!(
        "courier_request_duration_seconds",
        "Request duration in seconds"
    );
    metrics::describe_counter!(
        "courier_upstream_responses_total",
        "Upstream responses by status code"
    );
}

/// Prometheus metrics endpoint handler
///
/// Returns metrics in Prometheus text format for scraping.
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a request
pub fn record_request(status: &str, route: &str, duration_secs: f64) {
    metrics::counter!("courier_requests_total", "status" => status.to_string(), "route" => route.to_string())
        .increment(1);
    metrics::histogram!("courier_request_duration_seconds", "route" => route.to_string())
        .record(duration_secs);
}

/// Record an upstream response status code
pub fn record_upstream_status(status: u16) {
    metrics::counter!("courier_upstream_responses_total", "status" => status.to_string())
        .increment(1);
}
