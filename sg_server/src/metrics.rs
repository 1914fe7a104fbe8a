//! Prometheus metrics for admission control.
//!
//! Exposed in Prometheus text format when `METRICS_BIND` is set. Without an
//! installed exporter every recording call is a no-op.
//!
//! # Metrics
//!
//! - **HTTP**: request counts and duration by method, path and status
//! - **Logins**: attempts by kind (`owner`, `admin`, `staff`) and outcome
//! - **Gate**: denials by reason
//! - **Shifts**: staff sessions ended by a shift cascade

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Admission Metrics
// ============================================================================

/// Increment login attempts counter.
pub fn login_attempts_total(kind: &'static str, outcome: &'static str) {
    metrics::counter!("login_attempts_total",
        "kind" => kind,
        "outcome" => outcome
    )
    .increment(1);
}

/// Increment gate denial counter.
pub fn gate_denials_total(reason: &'static str) {
    metrics::counter!("gate_denials_total", "reason" => reason).increment(1);
}

/// Count staff sessions closed because their shift ended.
pub fn shift_cascade_sessions(count: usize) {
    metrics::counter!("shift_cascade_sessions_total").increment(count as u64);
}
