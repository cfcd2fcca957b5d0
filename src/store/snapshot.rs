//! Snapshot store
//!
//! Append-only. Rows are unique on (snapshot_time, trading_symbol); a repeated
//! insert for an existing key is ignored so the first capture wins.

use super::error::StoreError;
use super::schema::{SNAPSHOT_INSERT, SNAPSHOT_SCHEMA};
use crate::bucket::{format_timestamp, Bucket, TIMESTAMP_FORMAT};
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;

/// One captured OI value for a symbol in a bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRow {
    pub bucket: Bucket,
    pub trading_symbol: String,
    pub oi: Option<i64>,
    pub oi_day_high: Option<i64>,
}

/// SQLite-backed snapshot store
pub struct SnapshotStore {
    conn: Mutex<Connection>,
}

impl SnapshotStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SNAPSHOT_SCHEMA)?;

        tracing::info!(path = %path.display(), "Snapshot store opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store (for testing)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SNAPSHOT_SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert rows that are not yet present, in one transaction.
    ///
    /// Returns how many rows were actually added.
    pub fn insert_if_absent(&self, rows: &[SnapshotRow]) -> Result<usize, StoreError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(SNAPSHOT_INSERT)?;
            for row in rows {
                inserted += stmt.execute(params![
                    format_timestamp(row.bucket.start()),
                    row.trading_symbol,
                    row.oi,
                    row.oi_day_high,
                ])?;
            }
        }
        tx.commit()?;

        Ok(inserted)
    }

    /// Every stored row, ordered by time then symbol
    pub fn load_all(&self) -> Result<Vec<SnapshotRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT snapshot_time, trading_symbol, oi, oi_day_high FROM oi_snapshot \
             ORDER BY snapshot_time, trading_symbol",
        )?;
        let raw = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, Option<i64>>(3)?,
            ))
        })?;
        let raw = raw.collect::<Result<Vec<_>, _>>()?;

        let mut out = Vec::with_capacity(raw.len());
        for (time, trading_symbol, oi, oi_day_high) in raw {
            match NaiveDateTime::parse_from_str(&time, TIMESTAMP_FORMAT) {
                Ok(instant) => out.push(SnapshotRow {
                    bucket: Bucket::containing(instant),
                    trading_symbol,
                    oi,
                    oi_day_high,
                }),
                Err(_) => {
                    tracing::warn!(
                        snapshot_time = %time,
                        symbol = %trading_symbol,
                        "Skipping snapshot row with unreadable time"
                    );
                }
            }
        }
        Ok(out)
    }

    /// Rows captured for one bucket
    pub fn rows_for(&self, bucket: Bucket) -> Result<Vec<SnapshotRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare_cached(
            "SELECT trading_symbol, oi, oi_day_high FROM oi_snapshot \
             WHERE snapshot_time = ?1 ORDER BY trading_symbol",
        )?;
        let rows = stmt.query_map(params![format_timestamp(bucket.start())], |row| {
            Ok(SnapshotRow {
                bucket,
                trading_symbol: row.get(0)?,
                oi: row.get(1)?,
                oi_day_high: row.get(2)?,
            })
        })?;
        let out = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(out)
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM oi_snapshot", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}
