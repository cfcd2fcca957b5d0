//! Live ingestion
//!
//! Polls an event source, normalizes ticks and upserts them into the live store

mod service;

pub use service::{IngestReport, IngestService, IngestStats, StopReason};
