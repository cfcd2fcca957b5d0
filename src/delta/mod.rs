//! OI delta engine
//!
//! Compares two snapshot buckets per strike and option type

mod engine;
mod index;
mod types;

pub use engine::DeltaEngine;
pub use index::{BucketIndex, IndexedOi};
pub use types::{
    Classification, CompareError, CompareRequest, Comparison, DeltaRecord, StrikeRange,
};
