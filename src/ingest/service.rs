//! Ingest loop
//!
//! Each received message is one batch: its lines are normalized and the
//! surviving rows committed in one transaction. Nothing is buffered across
//! messages, so a message that was received but not yet committed when the
//! process dies is lost.

use crate::feed::{EventSource, SourceError};
use crate::store::{LiveStore, StoreError};
use crate::telemetry::{self, CounterMetric, LatencyMetric};
use crate::tick::{normalize_line, NormalizedTick};
use chrono::{Local, NaiveDateTime};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters accumulated over one run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub messages: u64,
    pub lines: u64,
    pub lines_dropped: u64,
    pub rows_written: u64,
    pub batches: u64,
}

/// Why the loop ended
#[derive(Debug)]
pub enum StopReason {
    /// Shutdown signal received
    Shutdown,
    /// Source closed or disconnected
    SourceEnded(SourceError),
}

/// Outcome of a completed run
#[derive(Debug)]
pub struct IngestReport {
    pub stats: IngestStats,
    pub stop: StopReason,
}

/// Single-threaded ingest loop over one event source
pub struct IngestService<S> {
    source: S,
    store: Arc<LiveStore>,
    poll_timeout: Duration,
    stats: IngestStats,
}

impl<S: EventSource> IngestService<S> {
    pub fn new(source: S, store: Arc<LiveStore>, poll_timeout: Duration) -> Self {
        Self {
            source,
            store,
            poll_timeout,
            stats: IngestStats::default(),
        }
    }

    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Poll until `shutdown` resolves or the source ends, then close the source.
    ///
    /// A store failure stops the loop and is returned after the source is closed.
    pub async fn run(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<IngestReport, StoreError> {
        tracing::info!(poll_timeout_ms = self.poll_timeout.as_millis() as u64, "Ingest started");

        let result = self.poll_loop(shutdown).await;
        self.source.close().await;

        match &result {
            Ok(stop) => tracing::info!(stop = ?stop, stats = ?self.stats, "Ingest stopped"),
            Err(e) => tracing::error!(error = %e, stats = ?self.stats, "Ingest aborted"),
        }

        result.map(|stop| IngestReport {
            stats: self.stats,
            stop,
        })
    }

    async fn poll_loop(
        &mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<StopReason, StoreError> {
        tokio::pin!(shutdown);

        loop {
            let received = tokio::select! {
                biased;

                _ = &mut shutdown => return Ok(StopReason::Shutdown),
                received = self.source.try_recv(self.poll_timeout) => received,
            };

            match received {
                Ok(Some(message)) => {
                    self.process_message(&message, Local::now().naive_local())?;
                }
                Ok(None) => continue,
                Err(e) => return Ok(StopReason::SourceEnded(e)),
            }
        }
    }

    /// Normalize every line of `message` and commit the survivors as one batch.
    ///
    /// Returns the number of rows written.
    pub fn process_message(
        &mut self,
        message: &str,
        now: NaiveDateTime,
    ) -> Result<usize, StoreError> {
        self.stats.messages += 1;

        let mut batch: Vec<NormalizedTick> = Vec::new();
        for line in message.lines().map(str::trim).filter(|l| !l.is_empty()) {
            self.stats.lines += 1;
            telemetry::increment(CounterMetric::TicksReceived, 1);
            match normalize_line(line, now) {
                Ok(tick) => batch.push(tick),
                Err(e) => {
                    self.stats.lines_dropped += 1;
                    telemetry::increment(CounterMetric::TicksDropped, 1);
                    tracing::warn!(line, error = %e, "Error parsing tick");
                }
            }
        }

        if batch.is_empty() {
            return Ok(0);
        }

        let started = Instant::now();
        let written = self.store.upsert_batch(&batch)?;
        telemetry::record_latency(LatencyMetric::BatchCommit, started.elapsed());
        telemetry::increment(CounterMetric::RowsUpserted, written as u64);
        telemetry::increment(CounterMetric::BatchesCommitted, 1);

        self.stats.rows_written += written as u64;
        self.stats.batches += 1;
        tracing::debug!(rows = written, "Committed tick batch");

        Ok(written)
    }
}
