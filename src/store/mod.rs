//! Persistence
//!
//! SQLite-backed live and snapshot stores

mod error;
mod live;
mod schema;
mod snapshot;

pub use error::StoreError;
pub use live::{LiveOi, LiveStore};
pub use snapshot::{SnapshotRow, SnapshotStore};
