//! In-process event source

use super::{EventSource, SourceError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// Event source fed through a `tokio::sync::mpsc` channel
pub struct ChannelSource {
    rx: mpsc::Receiver<String>,
}

impl ChannelSource {
    /// Create a source and the sender that feeds it
    pub fn new(buffer: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(buffer);
        (tx, Self { rx })
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn try_recv(&mut self, timeout: Duration) -> Result<Option<String>, SourceError> {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(message)) => Ok(Some(message)),
            Ok(None) => Err(SourceError::Closed),
            Err(_elapsed) => Ok(None),
        }
    }

    async fn close(&mut self) {
        self.rx.close();
    }
}
