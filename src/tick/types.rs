//! Tick types

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// One feed line as received, fields kept loose for coercion
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTick {
    #[serde(default)]
    pub last_trade_time: Option<Value>,
    #[serde(default)]
    pub exchange_timestamp: Option<Value>,
    #[serde(default)]
    pub exchange_token: Option<Value>,
    #[serde(default)]
    pub instrument_token: Option<Value>,
    #[serde(default)]
    pub trading_symbol: Option<Value>,
    #[serde(default)]
    pub last_price: Option<Value>,
    #[serde(default)]
    pub bid_depth: Option<Value>,
    #[serde(default)]
    pub ask_depth: Option<Value>,
    #[serde(default)]
    pub volume: Option<Value>,
    #[serde(default)]
    pub oi: Option<Value>,
    #[serde(default)]
    pub oi_day_high: Option<Value>,
    #[serde(default)]
    pub oi_day_low: Option<Value>,
}

/// Canonical row written to the live store, keyed by `token`
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTick {
    /// Last trade time
    pub timestamp: NaiveDateTime,
    pub exchange_timestamp: NaiveDateTime,
    /// Exchange token
    pub token: i64,
    pub instrument_token: i64,
    pub trading_symbol: Option<String>,
    pub last_price: Option<f64>,
    pub bid_price: Option<f64>,
    pub bid_qty: Option<i64>,
    pub ask_price: Option<f64>,
    pub ask_qty: Option<i64>,
    pub volume: Option<f64>,
    pub oi: Option<i64>,
    pub oi_day_high: Option<i64>,
    pub oi_day_low: Option<i64>,
}

/// Why a tick line was dropped
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Non-numeric {field}: {value}")]
    NonNumeric { field: &'static str, value: String },
}
