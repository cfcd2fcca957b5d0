//! Compare command implementation

use super::query::load_engine;
use crate::bucket::TIMESTAMP_FORMAT;
use crate::config::Config;
use crate::delta::{CompareError, CompareRequest, Comparison, DeltaEngine, StrikeRange};
use crate::symbol::Expiry;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Args, ValueEnum};

/// A `--t1`/`--t2` value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeArg {
    /// Anchored on `--date` or the latest snapshot date
    TimeOfDay(NaiveTime),
    At(NaiveDateTime),
}

impl TimeArg {
    pub fn anchor(self, date: NaiveDate) -> NaiveDateTime {
        match self {
            TimeArg::TimeOfDay(time) => date.and_time(time),
            TimeArg::At(at) => at,
        }
    }
}

pub fn parse_time(value: &str) -> Result<TimeArg, String> {
    let value = value.trim();
    if let Ok(at) = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT) {
        return Ok(TimeArg::At(at));
    }
    ["%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
        .map(TimeArg::TimeOfDay)
        .ok_or_else(|| format!("expected HH:MM, HH:MM:SS or YYYY-MM-DD HH:MM:SS, got {value:?}"))
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    #[arg(long)]
    pub symbol: String,

    /// `DD-MM` or `DD-Mon`
    #[arg(long)]
    pub expiry: Expiry,

    /// Earlier time; resolved to the first snapshot at or after it
    #[arg(long, value_parser = parse_time)]
    pub t1: TimeArg,

    /// Later time; resolved to the last snapshot at or before it
    #[arg(long, value_parser = parse_time)]
    pub t2: TimeArg,

    /// Date for time-of-day values (`YYYY-MM-DD`)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    #[arg(long)]
    pub strike_min: Option<u64>,

    #[arg(long)]
    pub strike_max: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

impl CompareArgs {
    pub fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let engine = load_engine(config)?;

        let request = match self.request(&engine) {
            Ok(request) => request,
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        };

        match engine.compare(&request) {
            Ok(comparison) => self.print(&engine, &request, &comparison),
            Err(e) => {
                println!("{e}");
                Ok(())
            }
        }
    }

    /// Anchor time-of-day values and apply the strike filter
    pub fn request(&self, engine: &DeltaEngine) -> Result<CompareRequest, CompareError> {
        let date = match self.date {
            Some(date) => date,
            None => engine
                .latest(&self.symbol, self.expiry)
                .map(|latest| latest.date())
                .ok_or_else(|| CompareError::NoTimes {
                    symbol: self.symbol.clone(),
                    expiry: self.expiry,
                })?,
        };

        let all = StrikeRange::all();
        let strikes = StrikeRange::new(
            self.strike_min.unwrap_or(all.min),
            self.strike_max.unwrap_or(all.max),
        );

        Ok(CompareRequest {
            symbol: self.symbol.clone(),
            expiry: self.expiry,
            t1: self.t1.anchor(date),
            t2: self.t2.anchor(date),
            strikes,
        })
    }

    fn print(
        &self,
        engine: &DeltaEngine,
        request: &CompareRequest,
        comparison: &Comparison,
    ) -> anyhow::Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(comparison)?),
            OutputFormat::Table => {
                let unfiltered = CompareRequest {
                    strikes: StrikeRange::all(),
                    ..request.clone()
                };
                print!("{}", render_table(comparison));
                if let Ok(Some((lo, hi))) = engine.strike_bounds(&unfiltered) {
                    println!("Available strikes: {lo} - {hi}");
                }
            }
        }
        Ok(())
    }
}

pub fn render_table(comparison: &Comparison) -> String {
    let mut out = format!(
        "{} {}  T1 {}  T2 {}\n",
        comparison.symbol, comparison.expiry, comparison.t1, comparison.t2
    );
    out.push_str(&format!(
        "{:>8} {:>4} {:>12} {:>12} {:>12}  {}\n",
        "STRIKE", "TYPE", "T1_OI", "T2_OI", "CHANGE", "CLASS"
    ));
    for record in &comparison.records {
        out.push_str(&format!(
            "{:>8} {:>4} {:>12} {:>12} {:>12}  {}\n",
            record.strike,
            record.option_type,
            record.t1_oi,
            record.t2_oi,
            record.change(),
            record.classification.as_str()
        ));
    }
    out
}
