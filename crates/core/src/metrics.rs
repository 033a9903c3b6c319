//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Media probes (outcome, duration)
//! - Conversions (terminal outcome, duration, active runs)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Probe Metrics
// =============================================================================

/// Probes total by result.
pub static PROBES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("clipwright_probes_total", "Total media probes"),
        &["result"], // "success" or a ProbeError kind
    )
    .unwrap()
});

/// Probe duration in seconds.
pub static PROBE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "clipwright_probe_duration_seconds",
            "Duration of media probes",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions total by terminal outcome.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("clipwright_conversions_total", "Total conversion runs"),
        &["outcome"], // "succeeded", "failed_spawn", "failed_engine", "failed_timeout", "cancelled"
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "clipwright_conversion_duration_seconds",
            "Duration of conversion runs",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0, 3600.0]),
        &["outcome"],
    )
    .unwrap()
});

/// Conversions currently running (0 or 1).
pub static CONVERSIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "clipwright_conversions_active",
        "Number of conversions currently running",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Probes
        Box::new(PROBES_TOTAL.clone()),
        Box::new(PROBE_DURATION.clone()),
        // Conversions
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(CONVERSIONS_ACTIVE.clone()),
    ]
}
