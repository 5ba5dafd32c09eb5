//! Prometheus exporter for the process-wide metrics recorder.
//!
//! Everything recorded through the `metrics` macros (admission outcomes,
//! conflict retries, promotions, store query timings, job runs, pool gauges)
//! is served in text format on `GET /metrics` of the configured address.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use tracing::info;

use crate::config::MetricsConfig;

/// Histogram buckets for store query and transaction durations, in seconds.
const DURATION_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.5, 1.0, 2.0, 5.0];

/// Exporter serving on `addr`, not yet installed.
pub fn exporter(addr: SocketAddr) -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(DURATION_BUCKETS)
}

/// Install the global recorder and start the HTTP listener.
///
/// Must be called once, from inside the tokio runtime, before any metric is
/// recorded. Does nothing when the exporter is disabled.
pub fn init_metrics(config: &MetricsConfig) -> anyhow::Result<()> {
    if !config.enabled {
        info!("Metrics exporter disabled");
        return Ok(());
    }

    let addr = config.socket_addr()?;
    exporter(addr)?.install()?;
    info!(%addr, "Prometheus exporter listening");
    Ok(())
}
