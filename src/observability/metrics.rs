//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by method, status, origin
//! - `proxy_request_duration_seconds` (histogram): latency by method, origin
//! - `proxy_upstream_errors_total` (counter): requests that ended in a 500
//! - `proxy_rewrites_total` (counter): rewritten bodies and locations, by kind

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, origin: &str, start: Instant) {
    metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "origin" => origin.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "origin" => origin.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a request that failed inside the pipeline.
pub fn record_upstream_error(origin: &str) {
    metrics::counter!("proxy_upstream_errors_total", "origin" => origin.to_string()).increment(1);
}

/// Record a rewrite (`"body"` or `"redirect"`).
pub fn record_rewrite(kind: &'static str) {
    metrics::counter!("proxy_rewrites_total", "kind" => kind).increment(1);
}
