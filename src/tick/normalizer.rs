//! Raw tick to live row coercion

use super::types::{NormalizeError, NormalizedTick, RawTick};
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

/// Accepted naive timestamp layouts, tried in order
const TIMESTAMP_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse and normalize one feed line
pub fn normalize_line(line: &str, now: NaiveDateTime) -> Result<NormalizedTick, NormalizeError> {
    let raw: RawTick = serde_json::from_str(line)?;
    normalize(&raw, now)
}

/// Normalize a raw tick.
///
/// `now` is the fallback for absent or unreadable timestamps. Only the two
/// token fields can fail; everything else degrades to `None`.
pub fn normalize(raw: &RawTick, now: NaiveDateTime) -> Result<NormalizedTick, NormalizeError> {
    let token = required_int(raw.exchange_token.as_ref(), "exchange_token")?;
    let instrument_token = required_int(raw.instrument_token.as_ref(), "instrument_token")?;

    let (bid_price, bid_qty) = top_of_depth(raw.bid_depth.as_ref());
    let (ask_price, ask_qty) = top_of_depth(raw.ask_depth.as_ref());

    Ok(NormalizedTick {
        timestamp: timestamp_or(raw.last_trade_time.as_ref(), now),
        exchange_timestamp: timestamp_or(raw.exchange_timestamp.as_ref(), now),
        token,
        instrument_token,
        trading_symbol: raw.trading_symbol.as_ref().and_then(to_text),
        last_price: raw.last_price.as_ref().and_then(to_float),
        bid_price,
        bid_qty,
        ask_price,
        ask_qty,
        volume: raw.volume.as_ref().and_then(to_float),
        oi: raw.oi.as_ref().and_then(to_int),
        oi_day_high: raw.oi_day_high.as_ref().and_then(to_int),
        oi_day_low: raw.oi_day_low.as_ref().and_then(to_int),
    })
}

/// Parse a feed timestamp in any accepted layout
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.naive_local()))
}

fn timestamp_or(value: Option<&Value>, now: NaiveDateTime) -> NaiveDateTime {
    match value {
        None | Some(Value::Null) => now,
        Some(Value::String(s)) if s.trim().is_empty() => now,
        Some(Value::String(s)) => parse_timestamp(s).unwrap_or_else(|| {
            tracing::warn!(value = %s, "Unreadable tick timestamp, using local time");
            now
        }),
        Some(other) => {
            tracing::warn!(value = %other, "Unreadable tick timestamp, using local time");
            now
        }
    }
}

fn required_int(value: Option<&Value>, field: &'static str) -> Result<i64, NormalizeError> {
    match value {
        None | Some(Value::Null) => Err(NormalizeError::MissingField(field)),
        Some(v) => to_int(v).ok_or_else(|| NormalizeError::NonNumeric {
            field,
            value: v.to_string(),
        }),
    }
}

/// Price and quantity of the first level of a depth list
fn top_of_depth(depth: Option<&Value>) -> (Option<f64>, Option<i64>) {
    let level = match depth.and_then(Value::as_array).and_then(|levels| levels.first()) {
        Some(level) => level,
        None => return (None, None),
    };
    (
        level.get("price").and_then(to_float),
        level.get("quantity").and_then(to_int),
    )
}

fn to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Integers pass through, finite floats truncate, numeric strings parse
fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
