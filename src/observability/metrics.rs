//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (requests, latency, bytes, connections, errors)
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `flarepath_requests_total` (counter): requests by method and status
//! - `flarepath_request_duration_seconds` (histogram): handling latency
//! - `flarepath_bytes_received_total` / `flarepath_bytes_sent_total` (counters)
//! - `flarepath_active_connections` (gauge): current connection count
//! - `flarepath_errors_total` (counter): failures by kind
//! - `flarepath_websocket_sessions_total` (counter): completed upgrades
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are low-cardinality (method, status code, error kind)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "flarepath_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("flarepath_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_bytes_received(bytes: usize) {
    counter!("flarepath_bytes_received_total").increment(bytes as u64);
}

pub fn record_bytes_sent(bytes: usize) {
    counter!("flarepath_bytes_sent_total").increment(bytes as u64);
}

pub fn set_active_connections(count: u64) {
    gauge!("flarepath_active_connections").set(count as f64);
}

pub fn record_error(kind: &'static str) {
    counter!("flarepath_errors_total", "kind" => kind).increment(1);
}

pub fn record_rate_limited() {
    counter!("flarepath_rate_limited_total").increment(1);
}

pub fn record_websocket_session() {
    counter!("flarepath_websocket_sessions_total").increment(1);
}
