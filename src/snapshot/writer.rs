//! Bucket capture from the live store

use crate::bucket::Bucket;
use crate::store::{LiveStore, SnapshotRow, SnapshotStore, StoreError};
use crate::telemetry::{self, CounterMetric, LatencyMetric};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Result of one snapshot run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Live rows were found in the window
    Captured {
        bucket: Bucket,
        /// Distinct symbols seen in the window
        symbols: usize,
        /// Rows newly added; lower than `symbols` on a re-run
        inserted: usize,
    },
    /// Nothing ticked inside the window
    NoData { bucket: Bucket },
}

impl SnapshotOutcome {
    pub fn bucket(&self) -> Bucket {
        match self {
            SnapshotOutcome::Captured { bucket, .. } | SnapshotOutcome::NoData { bucket } => {
                *bucket
            }
        }
    }

    pub fn inserted(&self) -> usize {
        match self {
            SnapshotOutcome::Captured { inserted, .. } => *inserted,
            SnapshotOutcome::NoData { .. } => 0,
        }
    }
}

/// Copies live OI for a bucket window into the snapshot store
#[derive(Clone)]
pub struct SnapshotWriter {
    live: Arc<LiveStore>,
    snapshots: Arc<SnapshotStore>,
}

impl SnapshotWriter {
    pub fn new(live: Arc<LiveStore>, snapshots: Arc<SnapshotStore>) -> Self {
        Self { live, snapshots }
    }

    /// Snapshot the bucket containing `now`
    pub fn snapshot(&self, now: NaiveDateTime) -> Result<SnapshotOutcome, StoreError> {
        self.snapshot_bucket(Bucket::containing(now))
    }

    /// Snapshot an explicit bucket. Safe to call repeatedly: existing
    /// (bucket, symbol) rows are left untouched.
    pub fn snapshot_bucket(&self, bucket: Bucket) -> Result<SnapshotOutcome, StoreError> {
        let started = Instant::now();
        let live_rows = self.live.oi_in_window(bucket.start(), bucket.end())?;
        if live_rows.is_empty() {
            tracing::info!(%bucket, "No data found in this window");
            telemetry::increment(CounterMetric::EmptySnapshotWindows, 1);
            return Ok(SnapshotOutcome::NoData { bucket });
        }

        let mut seen = HashSet::new();
        let rows: Vec<SnapshotRow> = live_rows
            .into_iter()
            .filter_map(|live| {
                let symbol = live.trading_symbol?;
                seen.insert(symbol.clone()).then(|| SnapshotRow {
                    bucket,
                    trading_symbol: symbol,
                    oi: live.oi,
                    oi_day_high: live.oi_day_high,
                })
            })
            .collect();

        let inserted = self.snapshots.insert_if_absent(&rows)?;
        telemetry::increment(CounterMetric::SnapshotRowsWritten, inserted as u64);
        telemetry::record_latency(LatencyMetric::SnapshotCapture, started.elapsed());
        tracing::info!(%bucket, symbols = rows.len(), inserted, "Snapshot saved");

        Ok(SnapshotOutcome::Captured {
            bucket,
            symbols: rows.len(),
            inserted,
        })
    }

    pub fn snapshots(&self) -> &Arc<SnapshotStore> {
        &self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tick::NormalizedTick;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn tick(token: i64, symbol: Option<&str>, oi: i64, ts: NaiveDateTime) -> NormalizedTick {
        NormalizedTick {
            timestamp: ts,
            exchange_timestamp: ts,
            token,
            instrument_token: token,
            trading_symbol: symbol.map(str::to_string),
            last_price: None,
            bid_price: None,
            bid_qty: None,
            ask_price: None,
            ask_qty: None,
            volume: None,
            oi: Some(oi),
            oi_day_high: Some(oi),
            oi_day_low: None,
        }
    }

    fn writer() -> SnapshotWriter {
        SnapshotWriter::new(
            Arc::new(LiveStore::open_in_memory().unwrap()),
            Arc::new(SnapshotStore::open_in_memory().unwrap()),
        )
    }

    #[test]
    fn test_no_data_window() {
        let writer = writer();
        let outcome = writer.snapshot(at(9, 1, 0)).unwrap();
        assert_eq!(
            outcome,
            SnapshotOutcome::NoData {
                bucket: Bucket::containing(at(9, 0, 0))
            }
        );
        assert!(writer.snapshots().is_empty().unwrap());
    }

    #[test]
    fn test_snapshot_current_bucket_only() {
        let writer = writer();
        writer
            .live
            .upsert_batch(&[
                tick(1, Some("NIFTY25AUG24000CE"), 100, at(9, 0, 5)),
                tick(2, Some("NIFTY25AUG24100CE"), 200, at(9, 3, 5)),
            ])
            .unwrap();

        let outcome = writer.snapshot(at(9, 2, 0)).unwrap();
        assert_eq!(outcome.inserted(), 1);
        let rows = writer.snapshots().load_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trading_symbol, "NIFTY25AUG24000CE");
        assert_eq!(rows[0].bucket.start(), at(9, 0, 0));
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let writer = writer();
        writer
            .live
            .upsert_batch(&[tick(1, Some("NIFTY25AUG24000CE"), 100, at(9, 0, 5))])
            .unwrap();
        writer.snapshot(at(9, 1, 0)).unwrap();
        let first = writer.snapshots().load_all().unwrap();

        // OI moves within the same bucket; the first capture must stand
        writer
            .live
            .upsert_batch(&[tick(1, Some("NIFTY25AUG24000CE"), 999, at(9, 2, 0))])
            .unwrap();
        let outcome = writer.snapshot(at(9, 2, 30)).unwrap();

        assert_eq!(
            outcome,
            SnapshotOutcome::Captured {
                bucket: Bucket::containing(at(9, 0, 0)),
                symbols: 1,
                inserted: 0,
            }
        );
        assert_eq!(writer.snapshots().load_all().unwrap(), first);
    }

    #[test]
    fn test_rows_without_symbol_skipped() {
        let writer = writer();
        writer
            .live
            .upsert_batch(&[
                tick(1, None, 100, at(9, 0, 5)),
                tick(2, Some("NIFTY25AUG24000PE"), 50, at(9, 0, 6)),
            ])
            .unwrap();
        let outcome = writer.snapshot(at(9, 0, 30)).unwrap();
        assert_eq!(outcome.inserted(), 1);
    }

    #[test]
    fn test_duplicate_symbol_first_token_wins() {
        let writer = writer();
        writer
            .live
            .upsert_batch(&[
                tick(1, Some("NIFTY25AUG24000PE"), 10, at(9, 0, 5)),
                tick(2, Some("NIFTY25AUG24000PE"), 20, at(9, 0, 6)),
            ])
            .unwrap();
        let outcome = writer.snapshot(at(9, 0, 30)).unwrap();
        assert_eq!(outcome.inserted(), 1);
        assert_eq!(writer.snapshots().load_all().unwrap()[0].oi, Some(10));
    }
}
