//! CLI interface for oi-snapshot
//!
//! Provides subcommands for:
//! - `ingest`: Receive ticks into the live store
//! - `snapshot`: Capture 3-minute OI snapshots
//! - `run`: Ingest and snapshot in one process
//! - `symbols`, `expiries`, `times`: Browse the snapshot store
//! - `compare`: OI change between two times
//! - `config`: Show configuration

mod compare;
mod ingest;
mod query;
mod run;
mod snapshot;

pub use compare::{CompareArgs, OutputFormat};
pub use ingest::IngestArgs;
pub use query::{ExpiriesArgs, TimesArgs};
pub use run::RunArgs;
pub use snapshot::SnapshotArgs;

use crate::config::{Config, StoreConfig};
use crate::lifecycle::LifecycleManager;
use crate::store::LiveStore;
use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Parser, Debug)]
#[command(name = "oi-snapshot")]
#[command(about = "Tick ingestion, 3-minute open-interest snapshots and OI change comparison")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Receive ticks into the live store until Ctrl-C
    Ingest(IngestArgs),
    /// Capture snapshots on the 3-minute grid, or once
    Snapshot(SnapshotArgs),
    /// Ingest and snapshot in one process
    Run(RunArgs),
    /// List root symbols present in the snapshot store
    Symbols,
    /// List expiries of a symbol
    Expiries(ExpiriesArgs),
    /// List snapshot times of a symbol and expiry
    Times(TimesArgs),
    /// Compare OI per strike between two times
    Compare(CompareArgs),
    /// Show configuration
    Config,
}

impl Commands {
    pub async fn execute(self, config: &Config) -> anyhow::Result<()> {
        match self {
            Commands::Ingest(args) => args.execute(config).await,
            Commands::Snapshot(args) => args.execute(config).await,
            Commands::Run(args) => args.execute(config).await,
            Commands::Symbols => query::symbols(config),
            Commands::Expiries(args) => args.execute(config),
            Commands::Times(args) => args.execute(config),
            Commands::Compare(args) => args.execute(config),
            Commands::Config => {
                let rendered =
                    toml::to_string_pretty(config).context("Failed to render configuration")?;
                println!("Current configuration:");
                println!("{rendered}");
                Ok(())
            }
        }
    }
}

/// Open the live store, resetting it when the marker is not from today
pub(crate) fn open_live_store(store: &StoreConfig) -> anyhow::Result<Arc<LiveStore>> {
    let today = Local::now().date_naive();
    let lifecycle = LifecycleManager::new(&store.reset_marker_path);
    let reset = lifecycle.check(today)?;

    let live = LiveStore::open(&store.live_db_path, reset)
        .with_context(|| format!("Failed to open live store {}", store.live_db_path.display()))?;
    if reset {
        lifecycle.record_reset(today)?;
    }

    Ok(Arc::new(live))
}

/// Shutdown flag flipped by Ctrl-C
pub(crate) fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested");
                let _ = tx.send(true);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ctrl-C handler unavailable");
                // keep the sender alive so receivers never see a shutdown
                std::future::pending::<()>().await;
            }
        }
    });
    rx
}

/// Resolves once the flag is set or its sender is gone
pub(crate) async fn shutdown_requested(mut rx: watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
