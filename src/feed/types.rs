//! Feed types and errors

use std::time::Duration;
use thiserror::Error;

/// Errors raised by an event source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Initial connection could not be established
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Remote side went away and the source will not recover
    #[error("Feed disconnected")]
    Disconnected,
    /// Source was closed locally or its producer dropped
    #[error("Feed closed")]
    Closed,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reconnection backoff for sources that reconnect on their own
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Maximum attempts before giving up (0 = infinite)
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl ReconnectPolicy {
    /// Delay after `delay`, doubled and capped
    pub fn next_delay(&self, delay: Duration) -> Duration {
        (delay * 2).min(self.max_delay)
    }

    /// Whether `attempts` failures exhaust the policy
    pub fn exhausted(&self, attempts: u32) -> bool {
        self.max_attempts > 0 && attempts >= self.max_attempts
    }
}
