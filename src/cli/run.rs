//! Run command implementation

use super::snapshot::open_snapshot_store;
use super::{open_live_store, shutdown_on_ctrl_c, shutdown_requested};
use crate::config::Config;
use crate::feed::{self, EventSource};
use crate::ingest::{IngestReport, IngestService, StopReason};
use crate::snapshot::{SnapshotScheduler, SnapshotTarget, SnapshotWriter};
use crate::store::{LiveStore, SnapshotStore};
use anyhow::Context;
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the configured feed URL
    #[arg(long)]
    pub url: Option<String>,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut feed_config = config.feed.clone();
        if let Some(url) = &self.url {
            feed_config.url = url.clone();
        }

        let live = open_live_store(&config.store)?;
        let snapshots = Arc::new(open_snapshot_store(config)?);
        let source = feed::connect(&feed_config)
            .await
            .with_context(|| format!("Failed to connect to feed {}", feed_config.url))?;

        tracing::info!(url = %feed_config.url, "Starting ingest and snapshot scheduler");
        let (report, firings) = run_pipeline(
            source,
            live,
            snapshots,
            config.snapshot.target,
            feed_config.poll_timeout(),
            shutdown_on_ctrl_c(),
        )
        .await?;

        if let StopReason::SourceEnded(e) = &report.stop {
            tracing::warn!(error = %e, "Feed ended");
        }
        println!(
            "Ingested {} rows in {} batches, {} snapshot firings",
            report.stats.rows_written, report.stats.batches, firings
        );
        Ok(())
    }
}

/// Ingest from `source` while the scheduler snapshots in a background task.
///
/// The scheduler stops on `shutdown` or as soon as ingest ends, whichever
/// comes first. An ingest store failure is returned after the scheduler has
/// been joined.
pub(crate) async fn run_pipeline<S: EventSource>(
    source: S,
    live: Arc<LiveStore>,
    snapshots: Arc<SnapshotStore>,
    target: SnapshotTarget,
    poll_timeout: Duration,
    shutdown: watch::Receiver<bool>,
) -> anyhow::Result<(IngestReport, usize)> {
    let (ingest_done, ingest_stopped) = oneshot::channel::<()>();
    let scheduler_shutdown = shutdown_requested(shutdown.clone());
    let scheduler = SnapshotScheduler::new(SnapshotWriter::new(live.clone(), snapshots), target);
    let scheduler = tokio::spawn(scheduler.run(async move {
        tokio::select! {
            _ = scheduler_shutdown => {}
            _ = ingest_stopped => {}
        }
    }));

    let service = IngestService::new(source, live, poll_timeout);
    let report = service.run(shutdown_requested(shutdown)).await;
    let _ = ingest_done.send(());

    let firings = scheduler.await.context("Snapshot scheduler panicked")?;
    let report = report.context("Ingest failed")?;
    Ok((report, firings))
}
