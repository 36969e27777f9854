//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Platform API calls (per endpoint, per outcome)
//! - Captcha recognition
//! - Purchase attempts

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Platform API Metrics
// =============================================================================

/// Platform requests total by endpoint and outcome.
pub static PLATFORM_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "showgrab_platform_requests_total",
            "Total ticketing platform requests",
        ),
        // outcome: "success", "auth_expired", "http_error", "timeout", "error", "malformed"
        &["endpoint", "outcome"],
    )
    .unwrap()
});

/// Platform request duration in seconds.
pub static PLATFORM_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "showgrab_platform_request_duration_seconds",
            "Duration of ticketing platform requests",
        )
        .buckets(vec![0.025, 0.05, 0.1, 0.25, 0.5, 0.75, 1.0, 2.0]),
        &["endpoint"],
    )
    .unwrap()
});

// =============================================================================
// Captcha Metrics
// =============================================================================

/// Captcha solve attempts by result.
pub static CAPTCHA_SOLVES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("showgrab_captcha_solves_total", "Total captcha solve attempts"),
        &["result"], // "solved", "rejected", "error"
    )
    .unwrap()
});

/// Captcha solve duration in seconds.
pub static CAPTCHA_SOLVE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "showgrab_captcha_solve_duration_seconds",
            "Duration of captcha recognition requests",
        )
        .buckets(vec![1.0, 2.5, 5.0, 10.0, 20.0, 30.0, 45.0, 60.0]),
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Purchase Metrics
// =============================================================================

/// Purchase attempts by terminal result.
pub static PURCHASE_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "showgrab_purchase_attempts_total",
            "Total purchase workflow runs",
        ),
        // result: "purchased" or the failure kind
        &["result"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(PLATFORM_REQUESTS.clone()),
        Box::new(PLATFORM_REQUEST_DURATION.clone()),
        Box::new(CAPTCHA_SOLVES.clone()),
        Box::new(CAPTCHA_SOLVE_DURATION.clone()),
        Box::new(PURCHASE_ATTEMPTS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        PURCHASE_ATTEMPTS.with_label_values(&["purchased"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "showgrab_purchase_attempts_total"));
    }
}
