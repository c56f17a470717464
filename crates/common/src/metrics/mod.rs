//! Metrics and observability utilities
//!
//! Prometheus metrics for graph builds and their layers, with standardized
//! naming under the `litgraph` prefix.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all LitGraph metrics
pub const METRICS_PREFIX: &str = "litgraph";

/// Histogram buckets for whole graph builds (in seconds)
pub const BUILD_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 1min
    120.0,  // 2min
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of HTTP requests"
    );

    describe_histogram!(
        format!("{}_request_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "HTTP request latency in seconds"
    );

    describe_counter!(
        format!("{}_graph_builds_total", METRICS_PREFIX),
        Unit::Count,
        "Total graph builds by outcome"
    );

    describe_histogram!(
        format!("{}_graph_build_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Graph build latency in seconds"
    );

    describe_gauge!(
        format!("{}_layer_nodes", METRICS_PREFIX),
        Unit::Count,
        "Nodes in the last built layer"
    );

    describe_gauge!(
        format!("{}_layer_edges", METRICS_PREFIX),
        Unit::Count,
        "Edges in the last built layer"
    );

    describe_gauge!(
        format!("{}_layer_density", METRICS_PREFIX),
        "Pairwise edges per node in the last built layer"
    );

    describe_counter!(
        format!("{}_cache_hits_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache hits"
    );

    describe_counter!(
        format!("{}_cache_misses_total", METRICS_PREFIX),
        Unit::Count,
        "Total cache misses"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record request metrics
pub struct RequestMetrics {
    start: Instant,
    endpoint: String,
    method: String,
}

impl RequestMetrics {
    /// Start tracking a request
    pub fn start(method: &str, endpoint: &str) -> Self {
        Self {
            start: Instant::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
        }
    }

    /// Record request completion
    pub fn finish(self, status: u16) {
        let duration = self.start.elapsed().as_secs_f64();

        counter!(
            format!("{}_requests_total", METRICS_PREFIX),
            "method" => self.method.clone(),
            "endpoint" => self.endpoint.clone(),
            "status" => status.to_string()
        )
        .increment(1);

        histogram!(
            format!("{}_request_duration_seconds", METRICS_PREFIX),
            "method" => self.method,
            "endpoint" => self.endpoint
        )
        .record(duration);
    }
}

/// Record the outcome of one graph build
pub fn record_build(duration_secs: f64, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_graph_builds_total", METRICS_PREFIX),
        "status" => status
    )
    .increment(1);

    if success {
        histogram!(format!("{}_graph_build_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    }
}

/// Record the size of one layer
pub fn record_layer(layer: &'static str, nodes: usize, edges: usize, density: f64) {
    gauge!(format!("{}_layer_nodes", METRICS_PREFIX), "layer" => layer).set(nodes as f64);
    gauge!(format!("{}_layer_edges", METRICS_PREFIX), "layer" => layer).set(edges as f64);
    gauge!(format!("{}_layer_density", METRICS_PREFIX), "layer" => layer).set(density);
}

/// Helper to record cache metrics
pub fn record_cache(hit: bool, cache_name: &str) {
    if hit {
        counter!(
            format!("{}_cache_hits_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_cache_misses_total", METRICS_PREFIX),
            "cache" => cache_name.to_string()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in BUILD_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_recorders_without_exporter() {
        // No recorder installed: every call is a no-op
        record_build(0.5, true);
        record_build(0.1, false);
        record_layer("citations", 10, 12, 1.2);
        record_cache(true, "graph");

        let metrics = RequestMetrics::start("POST", "/v1/graph");
        metrics.finish(200);
    }
}
