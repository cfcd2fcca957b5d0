//! Fixed-width time buckets
//!
//! Wall-clock instants are grouped into 3-minute windows aligned to midnight.
//! No timezone conversion is done: the feed and the stores share one clock.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Serialize, Serializer};
use std::fmt;

/// Bucket width in seconds
pub const BUCKET_WIDTH_SECS: i64 = 180;

/// Storage format for every timestamp column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Bucket width
pub fn width() -> Duration {
    Duration::seconds(BUCKET_WIDTH_SECS)
}

/// Start of the bucket containing `instant`
pub fn bucket_start(instant: NaiveDateTime) -> NaiveDateTime {
    let secs_of_day = i64::from(instant.num_seconds_from_midnight());
    let offset = secs_of_day % BUCKET_WIDTH_SECS;
    let truncated = instant.with_nanosecond(0).unwrap_or(instant);
    truncated - Duration::seconds(offset)
}

/// Last representable instant of the bucket containing `instant` (inclusive bound).
///
/// Formatted with [`TIMESTAMP_FORMAT`] this is the bucket's last whole second.
pub fn bucket_end(instant: NaiveDateTime) -> NaiveDateTime {
    end_of(bucket_start(instant))
}

fn end_of(start: NaiveDateTime) -> NaiveDateTime {
    start + width() - Duration::nanoseconds(1)
}

/// First bucket boundary strictly after `instant`
pub fn next_grid_boundary(instant: NaiveDateTime) -> NaiveDateTime {
    bucket_start(instant) + width()
}

/// Format a timestamp the way the stores persist it
pub fn format_timestamp(instant: NaiveDateTime) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

/// Half-open window `[start, start + width)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Bucket {
    start: NaiveDateTime,
}

impl Bucket {
    /// Bucket containing `instant`
    pub fn containing(instant: NaiveDateTime) -> Self {
        Self {
            start: bucket_start(instant),
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Inclusive end, one nanosecond before the next bucket starts
    pub fn end(&self) -> NaiveDateTime {
        end_of(self.start)
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant < self.start + width()
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for Bucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
