//! Trading symbol parsing
//!
//! Splits an exchange trading symbol into root, expiry, strike and option type

mod parser;
mod types;

pub use parser::parse;
pub use types::{
    month_from_abbreviation, Contract, Expiry, ExpiryStyle, InvalidExpiry, OptionType,
    ParsedSymbol, MONTH_ABBREVIATIONS,
};
