//! Newline-delimited TCP event source

use super::{EventSource, SourceError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::net::TcpStream;

/// Reads one message per line from a TCP publisher
pub struct TcpLineSource {
    address: String,
    lines: Option<Lines<BufReader<TcpStream>>>,
}

impl TcpLineSource {
    pub async fn connect(address: impl Into<String>) -> Result<Self, SourceError> {
        let address = address.into();
        let stream = TcpStream::connect(&address)
            .await
            .map_err(|e| SourceError::ConnectionFailed(format!("{address}: {e}")))?;
        tracing::info!(address = %address, "Feed connected");

        Ok(Self {
            address,
            lines: Some(BufReader::new(stream).lines()),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl EventSource for TcpLineSource {
    async fn try_recv(&mut self, timeout: Duration) -> Result<Option<String>, SourceError> {
        let lines = self.lines.as_mut().ok_or(SourceError::Closed)?;
        // next_line is cancel safe, so a timeout never loses a partial line
        match tokio::time::timeout(timeout, lines.next_line()).await {
            Ok(Ok(Some(line))) => Ok(Some(line)),
            Ok(Ok(None)) => Err(SourceError::Disconnected),
            Ok(Err(e)) => Err(SourceError::Io(e)),
            Err(_elapsed) => Ok(None),
        }
    }

    async fn close(&mut self) {
        if self.lines.take().is_some() {
            tracing::info!(address = %self.address, "Feed closed");
        }
    }
}
