//! OI change comparison over the snapshot store

use super::index::{BucketIndex, IndexedOi};
use super::types::{CompareError, CompareRequest, Comparison, DeltaRecord, StrikeRange};
use crate::bucket::Bucket;
use crate::store::{SnapshotRow, SnapshotStore, StoreError};
use crate::symbol::{self, Expiry, OptionType};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A snapshot row that parsed into a strike contract
#[derive(Debug, Clone)]
struct Entry {
    bucket: Bucket,
    trading_symbol: String,
    root: String,
    expiry: Expiry,
    strike: u64,
    option_type: OptionType,
    oi: i64,
}

/// Snapshot rows enriched with their parsed symbol, ready for comparison.
///
/// Rows without OI, and rows whose symbol lacks a root, expiry or strike,
/// are left out.
#[derive(Debug, Clone, Default)]
pub struct DeltaEngine {
    entries: Vec<Entry>,
}

impl DeltaEngine {
    pub fn from_rows(rows: impl IntoIterator<Item = SnapshotRow>) -> Self {
        let entries = rows
            .into_iter()
            .filter_map(|row| {
                let oi = row.oi?;
                let parsed = symbol::parse(&row.trading_symbol);
                let contract = parsed.contract?;
                Some(Entry {
                    bucket: row.bucket,
                    strike: contract.strike?,
                    root: contract.root,
                    expiry: contract.expiry,
                    option_type: parsed.option_type,
                    trading_symbol: row.trading_symbol,
                    oi,
                })
            })
            .collect();
        Self { entries }
    }

    /// Single point-in-time read of the whole snapshot store
    pub fn load(store: &SnapshotStore) -> Result<Self, StoreError> {
        let rows = store.load_all()?;
        let total = rows.len();
        let engine = Self::from_rows(rows);
        tracing::debug!(total, usable = engine.entries.len(), "Loaded snapshot rows");
        Ok(engine)
    }

    /// Root symbols, sorted
    pub fn symbols(&self) -> Vec<String> {
        let roots: BTreeSet<&str> = self.entries.iter().map(|e| e.root.as_str()).collect();
        roots.into_iter().map(str::to_string).collect()
    }

    /// Expiries of `symbol` in calendar order
    pub fn expiries(&self, symbol: &str) -> Vec<Expiry> {
        let mut expiries: Vec<Expiry> = Vec::new();
        for entry in self.entries.iter().filter(|e| e.root == symbol) {
            if !expiries.contains(&entry.expiry) {
                expiries.push(entry.expiry);
            }
        }
        expiries.sort_by_key(|e| e.sort_key());
        expiries
    }

    /// Buckets with snapshots for `symbol` and `expiry`, ascending
    pub fn bucket_times(&self, symbol: &str, expiry: Expiry) -> Vec<Bucket> {
        self.index(symbol, expiry).times()
    }

    /// Time → symbol → OI view restricted to one symbol/expiry
    pub fn index(&self, symbol: &str, expiry: Expiry) -> BucketIndex {
        BucketIndex::build(
            self.entries
                .iter()
                .filter(|e| e.root == symbol && e.expiry == expiry)
                .map(|e| {
                    (
                        e.bucket,
                        e.trading_symbol.as_str(),
                        IndexedOi {
                            strike: e.strike,
                            option_type: e.option_type,
                            oi: e.oi,
                        },
                    )
                }),
        )
    }

    /// Resolve T1 forward and T2 backward onto recorded buckets
    pub fn resolve(
        &self,
        index: &BucketIndex,
        request: &CompareRequest,
    ) -> Result<(Bucket, Bucket), CompareError> {
        if index.is_empty() {
            return Err(CompareError::NoTimes {
                symbol: request.symbol.clone(),
                expiry: request.expiry,
            });
        }

        match (index.at_or_after(request.t1), index.at_or_before(request.t2)) {
            (Some(t1), Some(t2)) => Ok((t1, t2)),
            _ => Err(CompareError::NoDataForRange {
                t1: request.t1,
                t2: request.t2,
            }),
        }
    }

    /// Lowest and highest strike seen in either resolved bucket
    pub fn strike_bounds(
        &self,
        request: &CompareRequest,
    ) -> Result<Option<(u64, u64)>, CompareError> {
        let index = self.index(&request.symbol, request.expiry);
        let (t1, t2) = self.resolve(&index, request)?;

        let strikes = [t1, t2]
            .into_iter()
            .filter_map(|bucket| index.symbols(bucket))
            .flat_map(|symbols| symbols.values().map(|oi| oi.strike));
        Ok(strikes.fold(None, |bounds, strike| match bounds {
            None => Some((strike, strike)),
            Some((lo, hi)) => Some((lo.min(strike), hi.max(strike))),
        }))
    }

    /// Per-strike OI change between the buckets nearest to T1 and T2.
    ///
    /// A contract missing from one side counts as zero OI there.
    pub fn compare(&self, request: &CompareRequest) -> Result<Comparison, CompareError> {
        let index = self.index(&request.symbol, request.expiry);
        let (t1, t2) = self.resolve(&index, request)?;

        let records = build_records(&index, t1, t2, request.strikes);
        tracing::debug!(
            symbol = %request.symbol,
            expiry = %request.expiry,
            t1 = %t1,
            t2 = %t2,
            records = records.len(),
            "Built OI comparison"
        );

        Ok(Comparison {
            symbol: request.symbol.clone(),
            expiry: request.expiry,
            t1,
            t2,
            records,
        })
    }

    /// Most recent bucket time for `symbol` and `expiry`
    pub fn latest(&self, symbol: &str, expiry: Expiry) -> Option<NaiveDateTime> {
        self.bucket_times(symbol, expiry).last().map(Bucket::start)
    }
}

fn build_records(
    index: &BucketIndex,
    t1: Bucket,
    t2: Bucket,
    strikes: StrikeRange,
) -> Vec<DeltaRecord> {
    let empty: HashMap<String, IndexedOi> = HashMap::new();
    let t1_data = index.symbols(t1).unwrap_or(&empty);
    let t2_data = index.symbols(t2).unwrap_or(&empty);

    let all_symbols: BTreeSet<&String> = t1_data.keys().chain(t2_data.keys()).collect();

    let mut by_contract: BTreeMap<(u64, OptionType), (i64, i64)> = BTreeMap::new();
    for symbol in all_symbols {
        let contract = match t1_data.get(symbol).or_else(|| t2_data.get(symbol)) {
            Some(contract) => contract,
            None => continue,
        };
        if !strikes.contains(contract.strike) {
            continue;
        }
        let t1_oi = t1_data.get(symbol).map_or(0, |c| c.oi);
        let t2_oi = t2_data.get(symbol).map_or(0, |c| c.oi);
        by_contract.insert((contract.strike, contract.option_type), (t1_oi, t2_oi));
    }

    by_contract
        .into_iter()
        .map(|((strike, option_type), (t1_oi, t2_oi))| {
            DeltaRecord::new(strike, option_type, t1_oi, t2_oi)
        })
        .collect()
}
