//! Tick feed module
//!
//! Transport-independent event sources delivering newline-delimited JSON ticks

mod channel;
mod tcp;
mod types;
mod ws;

pub use channel::ChannelSource;
pub use tcp::TcpLineSource;
pub use types::{ReconnectPolicy, SourceError};
pub use ws::WsSource;

use crate::config::{FeedConfig, Transport};
use async_trait::async_trait;
use std::time::Duration;

/// A message stream the ingest loop polls
#[async_trait]
pub trait EventSource: Send {
    /// Wait up to `timeout` for the next message; `Ok(None)` when nothing arrived
    async fn try_recv(&mut self, timeout: Duration) -> Result<Option<String>, SourceError>;

    /// Release network resources
    async fn close(&mut self);
}

#[async_trait]
impl<S: EventSource + ?Sized> EventSource for Box<S> {
    async fn try_recv(&mut self, timeout: Duration) -> Result<Option<String>, SourceError> {
        (**self).try_recv(timeout).await
    }

    async fn close(&mut self) {
        (**self).close().await
    }
}

/// Open the source described by the feed configuration
pub async fn connect(config: &FeedConfig) -> Result<Box<dyn EventSource>, SourceError> {
    match config.transport {
        Transport::Ws => Ok(Box::new(WsSource::connect(
            config.url.clone(),
            config.reconnect_policy(),
        ))),
        Transport::Tcp => Ok(Box::new(TcpLineSource::connect(config.url.clone()).await?)),
    }
}
