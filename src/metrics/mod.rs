//! Metrics and observability utilities
//!
//! Provides metrics-rs counters and histograms with standardized
//! naming conventions for routing decisions.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// Metrics prefix for all query router metrics
pub const METRICS_PREFIX: &str = "queryrouter";

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_route_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total routing requests"
    );

    describe_histogram!(
        format!("{}_route_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Routing latency in seconds, including the model call"
    );

    describe_gauge!(
        format!("{}_route_selected_sources", METRICS_PREFIX),
        Unit::Count,
        "Number of sources selected by the last routing decision"
    );

    describe_counter!(
        format!("{}_route_fallbacks_total", METRICS_PREFIX),
        Unit::Count,
        "Routing attempts recovered by the fallback policy"
    );

    tracing::info!("Metrics registered");
}

/// Record a successful routing decision
pub fn record_route(duration_secs: f64, selected: usize) {
    counter!(
        format!("{}_route_requests_total", METRICS_PREFIX),
        "outcome" => "routed"
    )
    .increment(1);

    histogram!(format!("{}_route_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    gauge!(format!("{}_route_selected_sources", METRICS_PREFIX)).set(selected as f64);
}

/// Record a routing attempt recovered by the fallback policy
pub fn record_fallback(duration_secs: f64, strategy: &str) {
    counter!(
        format!("{}_route_requests_total", METRICS_PREFIX),
        "outcome" => "fallback"
    )
    .increment(1);

    counter!(
        format!("{}_route_fallbacks_total", METRICS_PREFIX),
        "strategy" => strategy.to_string()
    )
    .increment(1);

    histogram!(format!("{}_route_duration_seconds", METRICS_PREFIX)).record(duration_secs);
}
