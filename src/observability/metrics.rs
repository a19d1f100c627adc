//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_balancer_picks_total` (counter): selections by color, address
//! - `rpc_balancer_pick_failures_total` (counter): failed picks by color
//! - `rpc_balancer_backends` (gauge): group size by color
//! - `rpc_balancer_backend_errors` (gauge): errors in window by address
//! - `rpc_balancer_backend_requests` (gauge): calls in window by address
//! - `rpc_balancer_backend_latency_ms` (gauge): window mean latency by address
//!
//! The facade cannot unregister series, so colors and backends dropped by a
//! rebuild are zeroed through [`retire_group`] and [`retire_backend`].

use std::net::SocketAddr;
use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use crate::load_balancer::BackendStats;

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_pick(color: &str, address: &str) {
    counter!(
        "rpc_balancer_picks_total",
        "color" => color.to_string(),
        "address" => address.to_string()
    )
    .increment(1);
}

pub fn record_pick_failure(color: &str) {
    counter!("rpc_balancer_pick_failures_total", "color" => color.to_string()).increment(1);
}

pub fn record_group_size(color: &str, members: usize) {
    gauge!("rpc_balancer_backends", "color" => color.to_string()).set(members as f64);
}

/// Publish one backend's window summaries.
pub fn record_backend_stats(stats: &BackendStats) {
    let address = stats.address.clone();
    gauge!("rpc_balancer_backend_errors", "address" => address.clone()).set(stats.errors as f64);
    gauge!("rpc_balancer_backend_requests", "address" => address.clone()).set(stats.requests as f64);
    gauge!("rpc_balancer_backend_latency_ms", "address" => address).set(stats.mean_latency_ms);
}

/// Zero the size gauge of a color that no longer has a group.
pub fn retire_group(color: &str) {
    record_group_size(color, 0);
}

/// Zero the window gauges of a backend that left the ready set.
pub fn retire_backend(address: &str) {
    let address = address.to_string();
    gauge!("rpc_balancer_backend_errors", "address" => address.clone()).set(0.0);
    gauge!("rpc_balancer_backend_requests", "address" => address.clone()).set(0.0);
    gauge!("rpc_balancer_backend_latency_ms", "address" => address).set(0.0);
}
