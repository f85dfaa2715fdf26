//! Prometheus recorder and metric definitions

use anyhow::{Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Latency buckets in seconds, with sub-millisecond resolution for fast reads.
const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

pub fn install_prometheus_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .set_buckets(LATENCY_BUCKETS)
        .context("failed to set histogram buckets")?
        .install_recorder()
        .context("failed to install Prometheus recorder")
}

/// Register descriptions and zero values so HELP/TYPE lines are present from
/// startup.
pub fn describe_metrics() {
    describe_counter!("motorist_http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "motorist_http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_gauge!(
        "motorist_http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    );
    describe_counter!(
        "motorist_vehicle_selection_changes_total",
        "Selected-vehicle changes by operation (select/promote)"
    );

    gauge!("motorist_http_requests_in_flight").set(0.0);
    counter!("motorist_vehicle_selection_changes_total", "operation" => "select").absolute(0);
    counter!("motorist_vehicle_selection_changes_total", "operation" => "promote").absolute(0);
}
