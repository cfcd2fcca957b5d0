//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Non-blank lines received, whether or not they normalize
    TicksReceived,
    /// Lines that failed to normalize
    TicksDropped,
    /// Rows written to the live store
    RowsUpserted,
    /// Live store transactions committed
    BatchesCommitted,
    /// Rows inserted into the snapshot store
    SnapshotRowsWritten,
    /// Snapshot windows with no live rows
    EmptySnapshotWindows,
}

impl CounterMetric {
    pub fn name(self) -> &'static str {
        match self {
            CounterMetric::TicksReceived => "oi_ticks_received_total",
            CounterMetric::TicksDropped => "oi_ticks_dropped_total",
            CounterMetric::RowsUpserted => "oi_rows_upserted_total",
            CounterMetric::BatchesCommitted => "oi_batches_committed_total",
            CounterMetric::SnapshotRowsWritten => "oi_snapshot_rows_written_total",
            CounterMetric::EmptySnapshotWindows => "oi_snapshot_empty_windows_total",
        }
    }
}

/// Latency metric types
#[derive(Debug, Clone, Copy)]
pub enum LatencyMetric {
    /// Live store batch commit
    BatchCommit,
    /// Snapshot capture of one bucket
    SnapshotCapture,
}

impl LatencyMetric {
    pub fn name(self) -> &'static str {
        match self {
            LatencyMetric::BatchCommit => "oi_batch_commit_seconds",
            LatencyMetric::SnapshotCapture => "oi_snapshot_capture_seconds",
        }
    }
}

/// Add `value` to a counter
pub fn increment(metric: CounterMetric, value: u64) {
    metrics::counter!(metric.name()).increment(value);
}

/// Record a latency measurement
pub fn record_latency(metric: LatencyMetric, duration: Duration) {
    metrics::histogram!(metric.name()).record(duration.as_secs_f64());
}

/// Serve `/metrics` on every interface at `port`
pub fn install_exporter(port: u16) -> anyhow::Result<()> {
    let address = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(address)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(%address, "Metrics exporter listening");
    Ok(())
}
