//! Comparison types

use crate::bucket::Bucket;
use crate::symbol::{Expiry, OptionType};
use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

/// Direction of OI change between T1 and T2
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Increase,
    Decrease,
}

impl Classification {
    /// Unchanged OI counts as a decrease
    pub fn classify(t1_oi: i64, t2_oi: i64) -> Self {
        if t1_oi >= t2_oi {
            Classification::Decrease
        } else {
            Classification::Increase
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Increase => "increase",
            Classification::Decrease => "decrease",
        }
    }
}

/// OI at both ends of a comparison for one strike and option type
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeltaRecord {
    pub strike: u64,
    #[serde(rename = "type")]
    pub option_type: OptionType,
    pub t1_oi: i64,
    pub t2_oi: i64,
    pub classification: Classification,
}

impl DeltaRecord {
    pub fn new(strike: u64, option_type: OptionType, t1_oi: i64, t2_oi: i64) -> Self {
        Self {
            strike,
            option_type,
            t1_oi,
            t2_oi,
            classification: Classification::classify(t1_oi, t2_oi),
        }
    }

    /// Signed change from T1 to T2
    pub fn change(&self) -> i64 {
        self.t2_oi - self.t1_oi
    }
}

/// Inclusive strike filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrikeRange {
    pub min: u64,
    pub max: u64,
}

impl StrikeRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    /// Every strike
    pub fn all() -> Self {
        Self {
            min: 0,
            max: u64::MAX,
        }
    }

    pub fn contains(&self, strike: u64) -> bool {
        (self.min..=self.max).contains(&strike)
    }
}

impl Default for StrikeRange {
    fn default() -> Self {
        Self::all()
    }
}

/// Parameters of one comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareRequest {
    /// Root symbol
    pub symbol: String,
    pub expiry: Expiry,
    /// Resolved to the earliest bucket at or after this instant
    pub t1: NaiveDateTime,
    /// Resolved to the latest bucket at or before this instant
    pub t2: NaiveDateTime,
    pub strikes: StrikeRange,
}

/// Chart-ready comparison between two resolved buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub symbol: String,
    pub expiry: Expiry,
    pub t1: Bucket,
    pub t2: Bucket,
    /// Ordered by strike
    pub records: Vec<DeltaRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    /// The symbol/expiry pair has no snapshots at all
    #[error("No available times in the data for {symbol} {expiry}")]
    NoTimes { symbol: String, expiry: Expiry },
    /// T1 or T2 could not be mapped to a recorded bucket
    #[error("No data available for selected time range")]
    NoDataForRange {
        t1: NaiveDateTime,
        t2: NaiveDateTime,
    },
}
