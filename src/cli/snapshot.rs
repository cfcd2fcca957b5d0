//! Snapshot command implementation

use super::{shutdown_on_ctrl_c, shutdown_requested};
use crate::bucket::{self, Bucket};
use crate::config::Config;
use crate::snapshot::{SnapshotOutcome, SnapshotScheduler, SnapshotTarget, SnapshotWriter};
use crate::store::{LiveStore, SnapshotStore};
use anyhow::Context;
use chrono::{Local, NaiveDateTime};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Run a single job and exit
    #[arg(long)]
    pub once: bool,

    /// Capture the bucket containing this time (`YYYY-MM-DD HH:MM:SS`); implies --once
    #[arg(long, value_parser = parse_datetime)]
    pub at: Option<NaiveDateTime>,

    /// Override the configured snapshot target
    #[arg(long, value_enum)]
    pub target: Option<TargetArg>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum TargetArg {
    Current,
    Closed,
}

impl From<TargetArg> for SnapshotTarget {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::Current => SnapshotTarget::Current,
            TargetArg::Closed => SnapshotTarget::Closed,
        }
    }
}

fn parse_datetime(value: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(value, bucket::TIMESTAMP_FORMAT)
        .map_err(|e| format!("expected YYYY-MM-DD HH:MM:SS: {e}"))
}

impl SnapshotArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let target = self.target.map_or(config.snapshot.target, SnapshotTarget::from);
        let writer = open_writer(config)?;

        if self.once || self.at.is_some() {
            let bucket = match self.at {
                Some(at) => Bucket::containing(at),
                None => crate::snapshot::target_bucket(Local::now().naive_local(), target),
            };
            let outcome = writer.snapshot_bucket(bucket)?;
            print_outcome(&outcome);
            return Ok(());
        }

        let scheduler = SnapshotScheduler::new(writer, target);
        let firings = scheduler
            .run(shutdown_requested(shutdown_on_ctrl_c()))
            .await;
        println!("Snapshot scheduler stopped after {firings} firings");
        Ok(())
    }
}

/// Writer over the live store without resetting it; ingestion owns the reset
fn open_writer(config: &Config) -> anyhow::Result<SnapshotWriter> {
    let live = LiveStore::open(&config.store.live_db_path, false).with_context(|| {
        format!(
            "Failed to open live store {}",
            config.store.live_db_path.display()
        )
    })?;
    let snapshots = open_snapshot_store(config)?;
    Ok(SnapshotWriter::new(Arc::new(live), Arc::new(snapshots)))
}

pub(crate) fn open_snapshot_store(config: &Config) -> anyhow::Result<SnapshotStore> {
    SnapshotStore::open(&config.store.snapshot_db_path).with_context(|| {
        format!(
            "Failed to open snapshot store {}",
            config.store.snapshot_db_path.display()
        )
    })
}

pub(crate) fn print_outcome(outcome: &SnapshotOutcome) {
    match outcome {
        SnapshotOutcome::Captured {
            bucket,
            symbols,
            inserted,
        } => println!("Snapshot saved for {bucket}: {inserted} new rows ({symbols} symbols)"),
        SnapshotOutcome::NoData { bucket } => println!("No data found in window {bucket}"),
    }
}
