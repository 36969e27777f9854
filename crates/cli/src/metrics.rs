//! Metrics registry for one run.

use anyhow::{Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};

/// Create a registry holding every core collector.
pub fn init_registry() -> Result<Registry> {
    let registry = Registry::new();
    for metric in showgrab_core::metrics::all_metrics() {
        registry
            .register(metric)
            .context("Failed to register collector")?;
    }
    Ok(registry)
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics output is not UTF-8")
}
