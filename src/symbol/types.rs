//! Parsed symbol types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Month abbreviations in calendar order, title case
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Contract kind encoded at the tail of a trading symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OptionType {
    /// Call option
    #[serde(rename = "CE")]
    Ce,
    /// Put option
    #[serde(rename = "PE")]
    Pe,
    /// Future (neither CE nor PE found)
    #[serde(rename = "FUT")]
    Fut,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Ce => "CE",
            OptionType::Pe => "PE",
            OptionType::Fut => "FUT",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// How the expiry month was written in the symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpiryStyle {
    /// Single digit month, rendered `DD-MM`
    Numeric,
    /// Three letter month, rendered `DD-Mon`
    Abbreviated,
}

/// Expiry label: day and month, no year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Expiry {
    pub day: u8,
    pub month: u8,
    pub style: ExpiryStyle,
}

impl Expiry {
    pub fn numeric(day: u8, month: u8) -> Self {
        Self {
            day,
            month,
            style: ExpiryStyle::Numeric,
        }
    }

    pub fn abbreviated(day: u8, month: u8) -> Self {
        Self {
            day,
            month,
            style: ExpiryStyle::Abbreviated,
        }
    }

    /// Chronological sort key within a year
    pub fn sort_key(&self) -> (u8, u8) {
        (self.month, self.day)
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.style {
            ExpiryStyle::Numeric => write!(f, "{:02}-{:02}", self.day, self.month),
            ExpiryStyle::Abbreviated => {
                let name = (self.month as usize)
                    .checked_sub(1)
                    .and_then(|idx| MONTH_ABBREVIATIONS.get(idx))
                    .copied()
                    .unwrap_or("???");
                write!(f, "{:02}-{}", self.day, name)
            }
        }
    }
}

/// Error parsing an expiry label such as `05-08` or `25-Aug`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid expiry label: {0}")]
pub struct InvalidExpiry(pub String);

impl FromStr for Expiry {
    type Err = InvalidExpiry;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidExpiry(s.to_string());
        let (day, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let day: u8 = day.parse().map_err(|_| invalid())?;

        if month.chars().all(|c| c.is_ascii_digit()) {
            let month: u8 = month.parse().map_err(|_| invalid())?;
            return Ok(Expiry::numeric(day, month));
        }

        month_from_abbreviation(month)
            .map(|m| Expiry::abbreviated(day, m))
            .ok_or_else(invalid)
    }
}

impl Serialize for Expiry {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Month number (1-12) for a case-insensitive three letter abbreviation
pub fn month_from_abbreviation(abbr: &str) -> Option<u8> {
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(abbr))
        .map(|idx| idx as u8 + 1)
}

/// Root, expiry and strike recovered from a trading symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    pub root: String,
    pub expiry: Expiry,
    /// Absent for futures-style symbols
    pub strike: Option<u64>,
}

/// Result of parsing a trading symbol.
///
/// `contract` is `None` when no structural pattern matched; the option type
/// is always reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSymbol {
    pub option_type: OptionType,
    pub contract: Option<Contract>,
}

impl ParsedSymbol {
    pub fn root(&self) -> Option<&str> {
        self.contract.as_ref().map(|c| c.root.as_str())
    }

    pub fn expiry(&self) -> Option<Expiry> {
        self.contract.as_ref().map(|c| c.expiry)
    }

    pub fn strike(&self) -> Option<u64> {
        self.contract.as_ref().and_then(|c| c.strike)
    }
}
