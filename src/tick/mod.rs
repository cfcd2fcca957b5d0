//! Tick normalization
//!
//! Turns raw feed lines into canonical live-store rows

mod normalizer;
mod types;

pub use normalizer::{normalize, normalize_line, parse_timestamp};
pub use types::{NormalizeError, NormalizedTick, RawTick};
