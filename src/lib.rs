//! oi-snapshot: open-interest capture and comparison for exchange options
//!
//! This library provides the core components for:
//! - Tick normalization from newline-delimited JSON
//! - A live store holding the latest tick per instrument (SQLite)
//! - Daily reset of the live store
//! - Snapshots of open interest on a 3-minute grid
//! - Trading symbol parsing into root, expiry, strike and option type
//! - Per-strike OI change between two snapshot times
//! - Logging and Prometheus metrics

pub mod bucket;
pub mod cli;
pub mod config;
pub mod delta;
pub mod feed;
pub mod ingest;
pub mod lifecycle;
pub mod snapshot;
pub mod store;
pub mod symbol;
pub mod telemetry;
pub mod tick;
