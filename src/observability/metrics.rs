//! Metrics collection and exposition.
//!
//! # Metrics
//! - `dirroute_routes_mounted_total` (counter): routes installed at startup
//! - `dirroute_route_failures_total` (counter): routes that failed to mount
//! - `dirroute_route_reloads_total` (counter): reloads by `outcome`
//!   (`success`, `failure`)
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Prometheus endpoint is opt-in via `observability.metrics_enabled`

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

pub const ROUTES_MOUNTED: &str = "dirroute_routes_mounted_total";
pub const ROUTE_FAILURES: &str = "dirroute_route_failures_total";
pub const ROUTE_RELOADS: &str = "dirroute_route_reloads_total";

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

pub fn record_route_mounted() {
    metrics::counter!(ROUTES_MOUNTED).increment(1);
}

pub fn record_route_failure() {
    metrics::counter!(ROUTE_FAILURES).increment(1);
}

pub fn record_route_reload(success: bool) {
    let outcome = if success { "success" } else { "failure" };
    metrics::counter!(ROUTE_RELOADS, "outcome" => outcome).increment(1);
}
