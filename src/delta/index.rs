//! Bucket-time → symbol → OI view for one symbol/expiry

use crate::bucket::Bucket;
use crate::symbol::OptionType;
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};

/// OI of one contract in one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedOi {
    pub strike: u64,
    pub option_type: OptionType,
    pub oi: i64,
}

/// Read-only two-level index, built once per comparison
#[derive(Debug, Default, Clone)]
pub struct BucketIndex {
    buckets: BTreeMap<NaiveDateTime, HashMap<String, IndexedOi>>,
}

impl BucketIndex {
    pub fn build<'a>(entries: impl IntoIterator<Item = (Bucket, &'a str, IndexedOi)>) -> Self {
        let mut buckets: BTreeMap<NaiveDateTime, HashMap<String, IndexedOi>> = BTreeMap::new();
        for (bucket, symbol, oi) in entries {
            buckets
                .entry(bucket.start())
                .or_default()
                .insert(symbol.to_string(), oi);
        }
        Self { buckets }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Bucket times in ascending order
    pub fn times(&self) -> Vec<Bucket> {
        self.buckets.keys().map(|t| Bucket::containing(*t)).collect()
    }

    /// Earliest bucket starting at or after `t`
    pub fn at_or_after(&self, t: NaiveDateTime) -> Option<Bucket> {
        self.buckets
            .range(t..)
            .next()
            .map(|(start, _)| Bucket::containing(*start))
    }

    /// Latest bucket starting at or before `t`
    pub fn at_or_before(&self, t: NaiveDateTime) -> Option<Bucket> {
        self.buckets
            .range(..=t)
            .next_back()
            .map(|(start, _)| Bucket::containing(*start))
    }

    /// Symbols captured in `bucket`
    pub fn symbols(&self, bucket: Bucket) -> Option<&HashMap<String, IndexedOi>> {
        self.buckets.get(&bucket.start())
    }
}
