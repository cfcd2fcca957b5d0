//! WebSocket event source with automatic reconnection

use super::types::ReconnectPolicy;
use super::{EventSource, SourceError};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Keepalive ping interval
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Connection task output
#[derive(Debug, Clone, PartialEq, Eq)]
enum WsEvent {
    Text(String),
    Connected,
    Reconnecting { attempt: u32 },
    Disconnected,
}

/// Subscribes to a WebSocket feed; every text frame is one message
pub struct WsSource {
    url: String,
    rx: mpsc::Receiver<WsEvent>,
    task: Option<JoinHandle<()>>,
}

impl WsSource {
    /// Spawn the connection task. Connection failures surface through `try_recv`.
    pub fn connect(url: impl Into<String>, policy: ReconnectPolicy) -> Self {
        let url = url.into();
        let (tx, rx) = mpsc::channel(1024);
        let task_url = url.clone();
        let task = tokio::spawn(async move {
            run_connection_loop(task_url, policy, tx).await;
        });

        Self {
            url,
            rx,
            task: Some(task),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EventSource for WsSource {
    async fn try_recv(&mut self, timeout: Duration) -> Result<Option<String>, SourceError> {
        let deadline = Instant::now() + timeout;
        loop {
            let event = match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(event)) => event,
                Ok(None) => return Err(SourceError::Closed),
                Err(_elapsed) => return Ok(None),
            };

            match event {
                WsEvent::Text(text) => return Ok(Some(text)),
                WsEvent::Connected => tracing::info!(url = %self.url, "Feed connected"),
                WsEvent::Reconnecting { attempt } => {
                    tracing::warn!(attempt, url = %self.url, "Feed reconnecting...")
                }
                WsEvent::Disconnected => return Err(SourceError::Disconnected),
            }
        }
    }

    async fn close(&mut self) {
        self.rx.close();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        tracing::info!(url = %self.url, "Feed closed");
    }
}

impl Drop for WsSource {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Reconnect with exponential backoff until the policy is exhausted
async fn run_connection_loop(url: String, policy: ReconnectPolicy, tx: mpsc::Sender<WsEvent>) {
    let mut attempts = 0;
    let mut delay = policy.initial_delay;

    loop {
        match stream_frames(&url, &tx).await {
            Ok(()) => {
                tracing::info!("WebSocket connection closed cleanly");
                let _ = tx.send(WsEvent::Disconnected).await;
                return;
            }
            Err(e) => {
                attempts += 1;
                tracing::warn!(error = %e, attempt = attempts, "WebSocket connection error");

                if policy.exhausted(attempts) {
                    tracing::error!("Max reconnection attempts reached");
                    let _ = tx.send(WsEvent::Disconnected).await;
                    return;
                }
                if tx.is_closed() {
                    return;
                }

                let _ = tx.send(WsEvent::Reconnecting { attempt: attempts }).await;
                sleep(delay).await;
                delay = policy.next_delay(delay);
            }
        }
    }
}

/// Forward text frames until the server closes or the receiver goes away
async fn stream_frames(url: &str, tx: &mpsc::Sender<WsEvent>) -> Result<(), SourceError> {
    tracing::info!(url, "Connecting to WebSocket");

    let (ws_stream, _response) = connect_async(url)
        .await
        .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;
    let (mut write, mut read) = ws_stream.split();

    if tx.send(WsEvent::Connected).await.is_err() {
        return Ok(());
    }

    let mut ping = tokio::time::interval(PING_INTERVAL);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut awaiting_pong = false;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if tx.send(WsEvent::Text(text)).await.is_err() {
                            return Ok(());
                        }
                    }
                    Some(Ok(Message::Binary(data))) => match String::from_utf8(data) {
                        Ok(text) => {
                            if tx.send(WsEvent::Text(text)).await.is_err() {
                                return Ok(());
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "Dropping non UTF-8 binary frame"),
                    },
                    Some(Ok(Message::Ping(data))) => {
                        write
                            .send(Message::Pong(data))
                            .await
                            .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;
                    }
                    Some(Ok(Message::Pong(_))) => awaiting_pong = false,
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Received close frame");
                        return Ok(());
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => return Err(SourceError::ConnectionFailed(e.to_string())),
                    None => {
                        return Err(SourceError::ConnectionFailed(
                            "Stream ended unexpectedly".into(),
                        ))
                    }
                }
            }

            _ = ping.tick() => {
                if awaiting_pong {
                    return Err(SourceError::ConnectionFailed("Pong timeout".into()));
                }
                write
                    .send(Message::Ping(Vec::new()))
                    .await
                    .map_err(|e| SourceError::ConnectionFailed(e.to_string()))?;
                awaiting_pong = true;
            }
        }
    }
}
