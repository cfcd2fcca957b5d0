//! Snapshot store browsing commands

use super::snapshot::open_snapshot_store;
use crate::config::Config;
use crate::delta::DeltaEngine;
use crate::symbol::Expiry;
use clap::Args;

pub(crate) fn load_engine(config: &Config) -> anyhow::Result<DeltaEngine> {
    let store = open_snapshot_store(config)?;
    Ok(DeltaEngine::load(&store)?)
}

pub fn symbols(config: &Config) -> anyhow::Result<()> {
    let engine = load_engine(config)?;
    let symbols = engine.symbols();
    if symbols.is_empty() {
        println!("No symbols in the snapshot store");
    }
    for symbol in symbols {
        println!("{symbol}");
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct ExpiriesArgs {
    /// Root symbol, e.g. NIFTY
    #[arg(long)]
    pub symbol: String,
}

impl ExpiriesArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let engine = load_engine(config)?;
        let expiries = engine.expiries(&self.symbol);
        if expiries.is_empty() {
            println!("No expiries for {}", self.symbol);
        }
        for expiry in expiries {
            println!("{expiry}");
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct TimesArgs {
    #[arg(long)]
    pub symbol: String,

    /// `DD-MM` or `DD-Mon`
    #[arg(long)]
    pub expiry: Expiry,
}

impl TimesArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let engine = load_engine(config)?;
        let times = engine.bucket_times(&self.symbol, self.expiry);
        if times.is_empty() {
            println!("No available times in the data for {} {}", self.symbol, self.expiry);
        }
        for bucket in times {
            println!("{bucket}");
        }
        Ok(())
    }
}
