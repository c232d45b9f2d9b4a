//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define content service metrics (cache, loads, resolution, requests)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `tenant_config_cache_hits_total` / `_misses_total` (counter)
//! - `tenant_config_cache_entries` (gauge): cached tenant count
//! - `tenant_config_loads_total` (counter): loads by outcome
//! - `tenant_config_load_duration_seconds` (histogram): read + validate time
//! - `tenant_resolutions_total` (counter): resolution attempts by strategy and outcome
//! - `http_requests_total` (counter) and `http_request_duration_seconds` (histogram)
//!
//! # Design Decisions
//! - Recording without an installed exporter is a no-op
//! - Labels are low-cardinality: no slugs, no hosts

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => {
            register_metric_descriptions();
            tracing::info!(address = %addr, "Metrics endpoint started");
        }
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

fn register_metric_descriptions() {
    describe_counter!("tenant_config_cache_hits_total", "Config loads served from cache");
    describe_counter!("tenant_config_cache_misses_total", "Config loads that missed the cache");
    describe_gauge!("tenant_config_cache_entries", "Tenants currently cached");
    describe_counter!("tenant_config_loads_total", "Tenant documents read and validated, by outcome");
    describe_histogram!(
        "tenant_config_load_duration_seconds",
        "Time to read and validate a tenant document"
    );
    describe_counter!("tenant_resolutions_total", "Tenant resolution attempts by strategy");
    describe_counter!("http_requests_total", "HTTP requests served");
    describe_histogram!("http_request_duration_seconds", "HTTP request latency");
}

pub fn record_cache_hit() {
    counter!("tenant_config_cache_hits_total").increment(1);
}

pub fn record_cache_miss() {
    counter!("tenant_config_cache_misses_total").increment(1);
}

pub fn record_cache_size(size: usize) {
    gauge!("tenant_config_cache_entries").set(size as f64);
}

/// Record one read+validate of a tenant document. `outcome` is `ok` or an error code.
pub fn record_config_load(outcome: &str, start: Instant) {
    let outcome = outcome.to_string();
    counter!("tenant_config_loads_total", "outcome" => outcome.clone()).increment(1);
    histogram!("tenant_config_load_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_resolution(strategy: &str, matched: bool) {
    let outcome = if matched { "matched" } else { "miss" };
    counter!(
        "tenant_resolutions_total",
        "strategy" => strategy.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// `route` is the matched route template, never the raw path.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
