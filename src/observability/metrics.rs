//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): dispatched requests by matched, status
//! - `gateway_request_duration_seconds` (histogram): handler latency
//! - `gateway_migrations_applied_total` (counter): startups that migrated
//! - `gateway_addons_loaded` (gauge): addons attached at startup
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(matched: bool, status: u16, start: Instant) {
    let matched = if matched { "route" } else { "none" };
    metrics::counter!(
        "gateway_requests_total",
        "matched" => matched,
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "matched" => matched)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_migrations_applied() {
    metrics::counter!("gateway_migrations_applied_total").increment(1);
}

pub fn record_addons_loaded(count: usize) {
    metrics::gauge!("gateway_addons_loaded").set(count as f64);
}
