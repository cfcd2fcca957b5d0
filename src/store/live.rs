//! Live tick store
//!
//! One row per exchange token. Every batch is committed in a single
//! transaction so concurrent readers see the state before or after it,
//! never in between.

use super::error::StoreError;
use super::schema::{LIVE_DROP, LIVE_SCHEMA, LIVE_UPSERT};
use crate::bucket::{format_timestamp, TIMESTAMP_FORMAT};
use crate::tick::NormalizedTick;
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// OI fields of a live row, as read by the snapshot job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveOi {
    pub trading_symbol: Option<String>,
    pub oi: Option<i64>,
    pub oi_day_high: Option<i64>,
}

/// SQLite-backed live store
pub struct LiveStore {
    conn: Mutex<Connection>,
}

impl LiveStore {
    /// Open or create the store at `path`, dropping existing rows when `reset` is set
    pub fn open(path: impl AsRef<Path>, reset: bool) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self {
            conn: Mutex::new(Connection::open(path)?),
        };
        if reset {
            store.reset()?;
        } else {
            store.conn.lock().execute_batch(LIVE_SCHEMA)?;
        }

        tracing::info!(path = %path.display(), reset, "Live store opened");
        Ok(store)
    }

    /// In-memory store (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(LIVE_SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Drop and recreate the table
    pub fn reset(&self) -> Result<(), StoreError> {
        let conn = self.conn.lock();
        conn.execute(LIVE_DROP, [])?;
        conn.execute_batch(LIVE_SCHEMA)?;
        tracing::info!("Live store reset");
        Ok(())
    }

    /// Upsert a batch in one transaction; every column of an existing token is overwritten.
    ///
    /// Returns the number of rows written. An empty batch touches nothing.
    pub fn upsert_batch(&self, rows: &[NormalizedTick]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(LIVE_UPSERT)?;
            for row in rows {
                stmt.execute(params![
                    format_timestamp(row.timestamp),
                    format_timestamp(row.exchange_timestamp),
                    row.token,
                    row.instrument_token,
                    row.trading_symbol,
                    row.last_price,
                    row.bid_price,
                    row.bid_qty,
                    row.ask_price,
                    row.ask_qty,
                    row.volume,
                    row.oi,
                    row.oi_day_high,
                    row.oi_day_low,
                ])?;
            }
        }
        tx.commit()?;

        Ok(rows.len())
    }

    /// Rows whose tick timestamp lies in the inclusive window `[start, end]`
    pub fn oi_in_window(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<LiveOi>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT trading_symbol, oi, oi_day_high FROM market_data \
             WHERE timestamp >= ?1 AND timestamp <= ?2 ORDER BY token",
        )?;
        let rows = stmt.query_map(
            params![format_timestamp(start), format_timestamp(end)],
            |row| {
                Ok(LiveOi {
                    trading_symbol: row.get(0)?,
                    oi: row.get(1)?,
                    oi_day_high: row.get(2)?,
                })
            },
        )?;
        let out = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(out)
    }

    /// Current row for a token
    pub fn get(&self, token: i64) -> Result<Option<NormalizedTick>, StoreError> {
        let conn = self.conn.lock();
        let raw = conn
            .query_row(
                "SELECT timestamp, exc_timestamp, token, instrument_token, trading_symbol, \
                 ltp, bidprice, bidqty, askprice, askqty, volume, oi, oi_day_high, oi_day_low \
                 FROM market_data WHERE token = ?1",
                params![token],
                read_live_row,
            )
            .optional()?;

        raw.map(StoredRow::into_tick).transpose()
    }

    /// Number of tokens currently held
    pub fn len(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM market_data", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// Row with timestamps still in their stored text form
struct StoredRow {
    timestamp: String,
    exchange_timestamp: String,
    tick: NormalizedTick,
}

impl StoredRow {
    fn into_tick(self) -> Result<NormalizedTick, StoreError> {
        let mut tick = self.tick;
        tick.timestamp = parse_column("timestamp", &self.timestamp)?;
        tick.exchange_timestamp = parse_column("exc_timestamp", &self.exchange_timestamp)?;
        Ok(tick)
    }
}

fn read_live_row(row: &Row) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        timestamp: row.get(0)?,
        exchange_timestamp: row.get(1)?,
        tick: NormalizedTick {
            timestamp: NaiveDateTime::default(),
            exchange_timestamp: NaiveDateTime::default(),
            token: row.get(2)?,
            instrument_token: row.get(3)?,
            trading_symbol: row.get(4)?,
            last_price: row.get(5)?,
            bid_price: row.get(6)?,
            bid_qty: row.get(7)?,
            ask_price: row.get(8)?,
            ask_qty: row.get(9)?,
            volume: row.get(10)?,
            oi: row.get(11)?,
            oi_day_high: row.get(12)?,
            oi_day_low: row.get(13)?,
        },
    })
}

fn parse_column(column: &'static str, value: &str) -> Result<NaiveDateTime, StoreError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|_| {
        StoreError::InvalidTimestamp {
            column,
            value: value.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 8, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn tick(token: i64, oi: i64, ts: NaiveDateTime) -> NormalizedTick {
        NormalizedTick {
            timestamp: ts,
            exchange_timestamp: ts,
            token,
            instrument_token: token * 10,
            trading_symbol: Some(format!("NIFTY25AUG{}CE", 24000 + token)),
            last_price: Some(101.5),
            bid_price: Some(101.0),
            bid_qty: Some(75),
            ask_price: Some(102.0),
            ask_qty: Some(50),
            volume: Some(1500.0),
            oi: Some(oi),
            oi_day_high: Some(oi + 10),
            oi_day_low: Some(oi - 10),
        }
    }

    #[test]
    fn test_upsert_inserts_rows() {
        let store = LiveStore::open_in_memory().unwrap();
        let written = store
            .upsert_batch(&[tick(1, 100, at(9, 0, 1)), tick(2, 200, at(9, 0, 2))])
            .unwrap();
        assert_eq!(written, 2);
        assert_eq!(store.len().unwrap(), 2);
        assert_eq!(store.get(1).unwrap().unwrap(), tick(1, 100, at(9, 0, 1)));
    }

    #[test]
    fn test_upsert_last_write_wins() {
        let store = LiveStore::open_in_memory().unwrap();
        store.upsert_batch(&[tick(111, 500, at(9, 0, 10))]).unwrap();

        let mut second = tick(111, 300, at(9, 0, 40));
        second.last_price = None;
        second.trading_symbol = Some("NIFTY25AUG25000PE".to_string());
        store.upsert_batch(&[second.clone()]).unwrap();

        assert_eq!(store.len().unwrap(), 1);
        assert_eq!(store.get(111).unwrap().unwrap(), second);
    }

    #[test]
    fn test_later_row_in_same_batch_wins() {
        let store = LiveStore::open_in_memory().unwrap();
        store
            .upsert_batch(&[tick(7, 1, at(9, 0, 0)), tick(7, 2, at(9, 0, 1))])
            .unwrap();
        assert_eq!(store.get(7).unwrap().unwrap().oi, Some(2));
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let store = LiveStore::open_in_memory().unwrap();
        assert_eq!(store.upsert_batch(&[]).unwrap(), 0);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_window_is_inclusive() {
        let store = LiveStore::open_in_memory().unwrap();
        store
            .upsert_batch(&[
                tick(1, 10, at(8, 59, 59)),
                tick(2, 20, at(9, 0, 0)),
                tick(3, 30, at(9, 2, 59)),
                tick(4, 40, at(9, 3, 0)),
            ])
            .unwrap();

        let rows = store.oi_in_window(at(9, 0, 0), at(9, 2, 59)).unwrap();
        let ois: Vec<_> = rows.iter().map(|r| r.oi).collect();
        assert_eq!(ois, vec![Some(20), Some(30)]);
    }

    #[test]
    fn test_missing_token() {
        let store = LiveStore::open_in_memory().unwrap();
        assert!(store.get(42).unwrap().is_none());
    }

    #[test]
    fn test_reopen_with_reset_clears_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("live").join("market_data.db");

        {
            let store = LiveStore::open(&path, false).unwrap();
            store.upsert_batch(&[tick(1, 100, at(9, 0, 0))]).unwrap();
        }
        {
            let store = LiveStore::open(&path, false).unwrap();
            assert_eq!(store.len().unwrap(), 1);
        }
        let store = LiveStore::open(&path, true).unwrap();
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_failed_batch_invisible_to_second_handle() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("market_data.db");
        let writer = LiveStore::open(&path, false).unwrap();
        let reader = LiveStore::open(&path, false).unwrap();

        Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER reject_token BEFORE INSERT ON market_data \
                 WHEN NEW.token = 99 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let batch = [tick(1, 100, at(9, 0, 1)), tick(99, 200, at(9, 0, 2))];
        let result = writer.upsert_batch(&batch);
        assert!(result.is_err());

        assert!(reader.oi_in_window(at(9, 0, 0), at(9, 2, 59)).unwrap().is_empty());
        assert!(reader.get(1).unwrap().is_none());

        // the writer is usable again after the rollback
        writer.upsert_batch(&[tick(1, 100, at(9, 0, 1))]).unwrap();
        assert_eq!(reader.oi_in_window(at(9, 0, 0), at(9, 2, 59)).unwrap().len(), 1);
    }

    #[test]
    fn test_open_transaction_invisible_until_commit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("market_data.db");
        let reader = LiveStore::open(&path, false).unwrap();

        let mut conn = Connection::open(&path).unwrap();
        let tx = conn.transaction().unwrap();
        for token in [1_i64, 2] {
            tx.execute(
                LIVE_UPSERT,
                params![
                    "2025-08-01 09:00:05",
                    "2025-08-01 09:00:05",
                    token,
                    token,
                    format!("NIFTY25AUG{}CE", 24000 + token),
                    None::<f64>,
                    None::<f64>,
                    None::<i64>,
                    None::<f64>,
                    None::<i64>,
                    None::<f64>,
                    100 * token,
                    None::<i64>,
                    None::<i64>,
                ],
            )
            .unwrap();
            assert!(reader.oi_in_window(at(9, 0, 0), at(9, 2, 59)).unwrap().is_empty());
        }

        tx.commit().unwrap();
        let ois: Vec<_> = reader
            .oi_in_window(at(9, 0, 0), at(9, 2, 59))
            .unwrap()
            .iter()
            .map(|r| r.oi)
            .collect();
        assert_eq!(ois, vec![Some(100), Some(200)]);
    }

    #[test]
    fn test_reset() {
        let store = LiveStore::open_in_memory().unwrap();
        store.upsert_batch(&[tick(1, 100, at(9, 0, 0))]).unwrap();
        store.reset().unwrap();
        assert!(store.is_empty().unwrap());
    }
}
