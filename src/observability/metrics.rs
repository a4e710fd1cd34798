//! Metrics collection and exposition.
//!
//! # Metrics
//! - `ipconf_store_saves_total` (counter): saves by result
//! - `ipconf_store_save_duration_seconds` (histogram): save latency
//! - `ipconf_store_reloads_total` (counter): reload passes by outcome
//! - `ipconf_http_requests_total` (counter): requests by endpoint, status
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_save(ok: bool, started: Instant) {
    let result = if ok { "ok" } else { "error" };
    metrics::counter!("ipconf_store_saves_total", "result" => result).increment(1);
    metrics::histogram!("ipconf_store_save_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_reload(outcome: &'static str) {
    metrics::counter!("ipconf_store_reloads_total", "outcome" => outcome).increment(1);
}

pub fn record_request(endpoint: &'static str, status: u16) {
    metrics::counter!(
        "ipconf_http_requests_total",
        "endpoint" => endpoint,
        "status" => status.to_string()
    )
    .increment(1);
}
