//! Configuration types for oi-snapshot

use crate::feed::ReconnectPolicy;
use crate::snapshot::SnapshotTarget;
use crate::telemetry::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Tick feed transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// WebSocket, one message per text frame
    #[default]
    Ws,
    /// Plain TCP, one message per line
    Tcp,
}

/// Tick feed configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub transport: Transport,

    /// WebSocket URL or `host:port`
    #[serde(default = "default_feed_url")]
    pub url: String,

    /// How long one poll waits for a message
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Reconnection attempts before giving up (0 = infinite, WebSocket only)
    #[serde(default)]
    pub max_reconnects: u32,

    #[serde(default = "default_initial_reconnect_delay_ms")]
    pub initial_reconnect_delay_ms: u64,

    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,
}

fn default_feed_url() -> String {
    "ws://127.0.0.1:4801".to_string()
}
fn default_poll_timeout_ms() -> u64 {
    1000
}
fn default_initial_reconnect_delay_ms() -> u64 {
    1000
}
fn default_max_reconnect_delay_ms() -> u64 {
    30_000
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            transport: Transport::Ws,
            url: default_feed_url(),
            poll_timeout_ms: default_poll_timeout_ms(),
            max_reconnects: 0,
            initial_reconnect_delay_ms: default_initial_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
        }
    }
}

impl FeedConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            max_attempts: self.max_reconnects,
            initial_delay: Duration::from_millis(self.initial_reconnect_delay_ms),
            max_delay: Duration::from_millis(self.max_reconnect_delay_ms),
        }
    }
}

/// Database and marker locations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default = "default_live_db_path")]
    pub live_db_path: PathBuf,

    #[serde(default = "default_snapshot_db_path")]
    pub snapshot_db_path: PathBuf,

    /// File holding the date of the last live store reset
    #[serde(default = "default_reset_marker_path")]
    pub reset_marker_path: PathBuf,
}

fn default_live_db_path() -> PathBuf {
    PathBuf::from("market_data.db")
}
fn default_snapshot_db_path() -> PathBuf {
    PathBuf::from("snapshot_data.db")
}
fn default_reset_marker_path() -> PathBuf {
    PathBuf::from("last_run_date.txt")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            live_db_path: default_live_db_path(),
            snapshot_db_path: default_snapshot_db_path(),
            reset_marker_path: default_reset_marker_path(),
        }
    }
}

/// Snapshot scheduling configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SnapshotConfig {
    #[serde(default)]
    pub target: SnapshotTarget,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Prometheus exporter port; no exporter when unset
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Configuration bundled with the binary
    pub fn bundled() -> anyhow::Result<Self> {
        Ok(toml::from_str(include_str!("../config.toml.example"))?)
    }
}
