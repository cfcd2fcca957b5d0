//! Table definitions

/// Live table: one row per exchange token, overwritten on every tick
pub const LIVE_SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS market_data (
    timestamp TEXT,
    exc_timestamp TEXT,
    token INTEGER PRIMARY KEY,
    instrument_token INTEGER,
    trading_symbol TEXT,
    ltp REAL,
    bidprice REAL,
    bidqty INTEGER,
    askprice REAL,
    askqty INTEGER,
    volume REAL,
    oi INTEGER,
    oi_day_high INTEGER,
    oi_day_low INTEGER
);

CREATE INDEX IF NOT EXISTS idx_market_data_timestamp ON market_data(timestamp);
"#;

pub const LIVE_DROP: &str = "DROP TABLE IF EXISTS market_data";

pub const LIVE_UPSERT: &str = r#"
INSERT INTO market_data (
    timestamp, exc_timestamp, token, instrument_token, trading_symbol,
    ltp, bidprice, bidqty, askprice, askqty,
    volume, oi, oi_day_high, oi_day_low
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
ON CONFLICT(token) DO UPDATE SET
    timestamp = excluded.timestamp,
    exc_timestamp = excluded.exc_timestamp,
    instrument_token = excluded.instrument_token,
    trading_symbol = excluded.trading_symbol,
    ltp = excluded.ltp,
    bidprice = excluded.bidprice,
    bidqty = excluded.bidqty,
    askprice = excluded.askprice,
    askqty = excluded.askqty,
    volume = excluded.volume,
    oi = excluded.oi,
    oi_day_high = excluded.oi_day_high,
    oi_day_low = excluded.oi_day_low
"#;

/// Snapshot table: append-only, first row per (bucket, symbol) wins
pub const SNAPSHOT_SCHEMA: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;

CREATE TABLE IF NOT EXISTS oi_snapshot (
    snapshot_time TEXT NOT NULL,
    trading_symbol TEXT NOT NULL,
    oi INTEGER,
    oi_day_high INTEGER
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_snapshot_unique
    ON oi_snapshot(snapshot_time, trading_symbol);
"#;

pub const SNAPSHOT_INSERT: &str = r#"
INSERT OR IGNORE INTO oi_snapshot (snapshot_time, trading_symbol, oi, oi_day_high)
VALUES (?1, ?2, ?3, ?4)
"#;
