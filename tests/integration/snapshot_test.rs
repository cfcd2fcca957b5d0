//! Integration tests for on-disk snapshot capture and the daily reset

use chrono::{NaiveDate, NaiveDateTime};
use oi_snapshot::bucket::Bucket;
use oi_snapshot::lifecycle::LifecycleManager;
use oi_snapshot::snapshot::SnapshotWriter;
use oi_snapshot::store::{LiveStore, SnapshotStore};
use oi_snapshot::tick::normalize_line;
use std::sync::Arc;
use tempfile::TempDir;

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 8, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn seed(live: &LiveStore, token: i64, oi: i64, time: &str) {
    let line = format!(
        r#"{{"exchange_token": {token}, "instrument_token": {token}, "trading_symbol": "BANKEX25AUG6{token}PE", "last_trade_time": "2025-08-01 {time}", "oi": {oi}}}"#
    );
    let tick = normalize_line(&line, at(9, 0, 0)).unwrap();
    live.upsert_batch(&[tick]).unwrap();
}

#[test]
fn test_snapshot_rerun_is_idempotent_across_reopen() {
    let dir = TempDir::new().unwrap();
    let live_path = dir.path().join("market_data.db");
    let snapshot_path = dir.path().join("snapshots/snapshot_data.db");

    let live = Arc::new(LiveStore::open(&live_path, false).unwrap());
    seed(&live, 5500, 10, "09:00:01");
    seed(&live, 5600, 20, "09:02:59");

    let bucket = Bucket::containing(at(9, 1, 0));
    {
        let writer = SnapshotWriter::new(
            live.clone(),
            Arc::new(SnapshotStore::open(&snapshot_path).unwrap()),
        );
        assert_eq!(writer.snapshot_bucket(bucket).unwrap().inserted(), 2);
    }

    // OI moved but the bucket is already recorded
    seed(&live, 5500, 99, "09:02:00");
    let snapshots = Arc::new(SnapshotStore::open(&snapshot_path).unwrap());
    let writer = SnapshotWriter::new(live, snapshots.clone());
    assert_eq!(writer.snapshot_bucket(bucket).unwrap().inserted(), 0);

    let rows = snapshots.rows_for(bucket).unwrap();
    assert_eq!(rows.len(), 2);
    let first = rows
        .iter()
        .find(|r| r.trading_symbol == "BANKEX25AUG65500PE")
        .unwrap();
    assert_eq!(first.oi, Some(10));
}

#[test]
fn test_daily_reset_clears_live_store_once() {
    let dir = TempDir::new().unwrap();
    let live_path = dir.path().join("market_data.db");
    let lifecycle = LifecycleManager::new(dir.path().join("last_run_date.txt"));
    let day_one = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
    let day_two = NaiveDate::from_ymd_opt(2025, 8, 2).unwrap();

    // first ever start resets
    assert!(lifecycle.check(day_one).unwrap());
    let live = LiveStore::open(&live_path, true).unwrap();
    lifecycle.record_reset(day_one).unwrap();
    seed(&live, 5500, 10, "09:00:01");
    drop(live);

    // restart on the same day keeps data
    let reset = lifecycle.check(day_one).unwrap();
    assert!(!reset);
    let live = LiveStore::open(&live_path, reset).unwrap();
    assert_eq!(live.len().unwrap(), 1);
    drop(live);

    // next day starts empty
    let reset = lifecycle.check(day_two).unwrap();
    assert!(reset);
    let live = LiveStore::open(&live_path, reset).unwrap();
    assert!(live.is_empty().unwrap());
}
