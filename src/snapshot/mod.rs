//! Snapshot job
//!
//! Captures live OI into 3-minute buckets on a fixed wall-clock grid

mod scheduler;
mod writer;

pub use scheduler::{target_bucket, SnapshotScheduler, SnapshotTarget};
pub use writer::{SnapshotOutcome, SnapshotWriter};
