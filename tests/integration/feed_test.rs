//! Integration tests for the feed sources driving ingest

use futures_util::SinkExt;
use oi_snapshot::feed::{ReconnectPolicy, SourceError, TcpLineSource, WsSource};
use oi_snapshot::ingest::{IngestService, StopReason};
use oi_snapshot::store::LiveStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;

const LINE_A: &str = r#"{"exchange_token": 1, "instrument_token": 11, "trading_symbol": "NIFTY25AUG24500CE", "last_trade_time": "2025-08-01 09:00:05", "oi": 100}"#;
const LINE_B: &str = r#"{"exchange_token": 2, "instrument_token": 22, "trading_symbol": "NIFTY25AUG24500PE", "last_trade_time": "2025-08-01 09:00:06", "oi": 200}"#;

#[tokio::test]
async fn test_tcp_feed_ingest() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let payload = format!("{LINE_A}\nnot json\n{LINE_B}\n");
        socket.write_all(payload.as_bytes()).await.unwrap();
    });

    let source = TcpLineSource::connect(address).await.unwrap();
    server.await.unwrap();

    let live = Arc::new(LiveStore::open_in_memory().unwrap());
    let report = IngestService::new(source, live.clone(), Duration::from_millis(200))
        .run(std::future::pending())
        .await
        .unwrap();

    assert!(matches!(
        report.stop,
        StopReason::SourceEnded(SourceError::Disconnected)
    ));
    assert_eq!(report.stats.messages, 3);
    assert_eq!(report.stats.lines_dropped, 1);
    assert_eq!(live.len().unwrap(), 2);
}

#[tokio::test]
async fn test_ws_feed_ingest_batched_frame() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text(format!("{LINE_A}\n{LINE_B}")))
            .await
            .unwrap();
        ws.close(None).await.unwrap();
    });

    let policy = ReconnectPolicy {
        max_attempts: 1,
        ..Default::default()
    };
    let source = WsSource::connect(url, policy);

    let live = Arc::new(LiveStore::open_in_memory().unwrap());
    let report = IngestService::new(source, live.clone(), Duration::from_millis(200))
        .run(std::future::pending())
        .await
        .unwrap();
    server.await.unwrap();

    assert!(matches!(
        report.stop,
        StopReason::SourceEnded(SourceError::Disconnected)
    ));
    assert_eq!(report.stats.messages, 1);
    assert_eq!(report.stats.batches, 1);
    assert_eq!(live.get(2).unwrap().unwrap().oi, Some(200));
}
