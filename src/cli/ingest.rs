//! Ingest command implementation

use super::{open_live_store, shutdown_on_ctrl_c, shutdown_requested};
use crate::config::{Config, Transport};
use crate::feed;
use crate::ingest::{IngestService, StopReason};
use anyhow::Context;
use clap::Args;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Override the configured feed URL
    #[arg(long)]
    pub url: Option<String>,

    /// Read ticks over plain TCP instead of the configured transport
    #[arg(long)]
    pub tcp: bool,
}

impl IngestArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut feed_config = config.feed.clone();
        if let Some(url) = &self.url {
            feed_config.url = url.clone();
        }
        if self.tcp {
            feed_config.transport = Transport::Tcp;
        }

        let live = open_live_store(&config.store)?;
        let source = feed::connect(&feed_config)
            .await
            .with_context(|| format!("Failed to connect to feed {}", feed_config.url))?;

        tracing::info!(url = %feed_config.url, transport = ?feed_config.transport, "Starting ingest");

        let shutdown = shutdown_on_ctrl_c();
        let service = IngestService::new(source, live, feed_config.poll_timeout());
        let report = service.run(shutdown_requested(shutdown)).await?;

        if let StopReason::SourceEnded(e) = &report.stop {
            tracing::warn!(error = %e, "Feed ended");
        }
        println!(
            "Ingested {} rows in {} batches ({} lines dropped)",
            report.stats.rows_written, report.stats.batches, report.stats.lines_dropped
        );
        Ok(())
    }
}
