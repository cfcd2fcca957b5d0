//! End-to-end integration tests

use chrono::{NaiveDate, NaiveDateTime};
use oi_snapshot::config::Config;
use oi_snapshot::delta::{Classification, CompareRequest, DeltaEngine, StrikeRange};
use oi_snapshot::feed::ChannelSource;
use oi_snapshot::ingest::IngestService;
use oi_snapshot::snapshot::{SnapshotOutcome, SnapshotScheduler, SnapshotTarget, SnapshotWriter};
use oi_snapshot::store::{LiveStore, SnapshotStore};
use oi_snapshot::symbol::{Expiry, OptionType};
use std::sync::Arc;
use std::time::Duration;

fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 8, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

fn tick(token: i64, symbol: &str, oi: i64, time: &str) -> String {
    format!(
        r#"{{"exchange_token": {token}, "instrument_token": {token}, "trading_symbol": "{symbol}", "last_trade_time": "2025-08-01 {time}", "oi": {oi}, "oi_day_high": {oi}}}"#
    )
}

async fn ingest(live: &Arc<LiveStore>, messages: Vec<String>) {
    let (tx, source) = ChannelSource::new(messages.len().max(1));
    for message in messages {
        tx.send(message).await.unwrap();
    }
    drop(tx);

    IngestService::new(source, live.clone(), Duration::from_millis(20))
        .run(std::future::pending())
        .await
        .unwrap();
}

#[test]
fn test_config_example_loads() {
    let config = Config::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.toml.example")).unwrap();
    assert_eq!(config.snapshot.target, SnapshotTarget::Closed);
    assert_eq!(config.feed.poll_timeout_ms, 1000);
}

#[tokio::test]
async fn test_ingest_snapshot_compare() {
    let live = Arc::new(LiveStore::open_in_memory().unwrap());
    let snapshots = Arc::new(SnapshotStore::open_in_memory().unwrap());

    // first bucket: token 111 ticks twice, the later tick wins
    ingest(
        &live,
        vec![
            tick(111, "NIFTY25AUG24500CE", 500, "09:00:10"),
            format!(
                "{}\n{}",
                tick(222, "NIFTY25AUG24600PE", 700, "09:00:15"),
                tick(111, "NIFTY25AUG24500CE", 300, "09:00:40")
            ),
        ],
    )
    .await;

    let writer = SnapshotWriter::new(live.clone(), snapshots.clone());
    let scheduler = SnapshotScheduler::new(writer.clone(), SnapshotTarget::Closed);

    let outcome = scheduler.fire(at(9, 3, 0)).unwrap();
    assert_eq!(outcome.bucket().start(), at(9, 0, 0));
    assert_eq!(outcome.inserted(), 2);

    // second bucket: both contracts move
    ingest(
        &live,
        vec![format!(
            "{}\n{}",
            tick(111, "NIFTY25AUG24500CE", 450, "09:04:00"),
            tick(222, "NIFTY25AUG24600PE", 650, "09:05:59")
        )],
    )
    .await;
    assert_eq!(scheduler.fire(at(9, 6, 0)).unwrap().inserted(), 2);

    let engine = DeltaEngine::load(&snapshots).unwrap();
    assert_eq!(engine.symbols(), vec!["NIFTY".to_string()]);

    let expiry = Expiry::abbreviated(25, 8);
    assert_eq!(engine.expiries("NIFTY"), vec![expiry]);

    let comparison = engine
        .compare(&CompareRequest {
            symbol: "NIFTY".to_string(),
            expiry,
            t1: at(9, 0, 0),
            t2: at(9, 3, 0),
            strikes: StrikeRange::all(),
        })
        .unwrap();

    assert_eq!(comparison.records.len(), 2);
    let ce = &comparison.records[0];
    assert_eq!((ce.strike, ce.option_type), (24500, OptionType::Ce));
    assert_eq!((ce.t1_oi, ce.t2_oi), (300, 450));
    assert_eq!(ce.classification, Classification::Increase);

    let pe = &comparison.records[1];
    assert_eq!((pe.strike, pe.option_type), (24600, OptionType::Pe));
    assert_eq!((pe.t1_oi, pe.t2_oi), (700, 650));
    assert_eq!(pe.classification, Classification::Decrease);
}

#[tokio::test]
async fn test_empty_window_writes_nothing() {
    let live = Arc::new(LiveStore::open_in_memory().unwrap());
    let snapshots = Arc::new(SnapshotStore::open_in_memory().unwrap());

    ingest(&live, vec![tick(111, "NIFTY25AUG24500CE", 500, "09:00:10")]).await;

    let writer = SnapshotWriter::new(live, snapshots.clone());
    let outcome = writer.snapshot(at(9, 10, 0)).unwrap();

    assert!(matches!(outcome, SnapshotOutcome::NoData { .. }));
    assert!(snapshots.is_empty().unwrap());
}
