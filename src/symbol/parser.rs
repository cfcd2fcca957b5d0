//! Trading symbol decomposition
//!
//! Symbols are matched against an ordered rule table after the option type
//! markers have been stripped. The first rule that matches wins.

use super::types::{month_from_abbreviation, Contract, Expiry, OptionType, ParsedSymbol};

/// A structural rule over the marker-stripped symbol
struct Rule {
    name: &'static str,
    apply: fn(&str) -> Option<Contract>,
}

/// Tried in order; the first match wins
const RULES: &[Rule] = &[
    Rule {
        name: "yy-m-dd-strike",
        apply: numeric_expiry_with_strike,
    },
    Rule {
        name: "dd-mon-strike",
        apply: abbreviated_expiry_with_strike,
    },
    Rule {
        name: "dd-mon",
        apply: abbreviated_expiry,
    },
];

/// Parse a trading symbol into root, expiry, strike and option type.
///
/// Never fails: a symbol that matches no rule yields `contract: None`.
pub fn parse(symbol: &str) -> ParsedSymbol {
    let option_type = detect_option_type(symbol);
    let stripped = symbol.replace("CE", "").replace("PE", "").replace("FUT", "");

    let contract = RULES.iter().find_map(|rule| {
        let contract = (rule.apply)(&stripped)?;
        tracing::trace!(symbol, rule = rule.name, "Symbol matched");
        Some(contract)
    });

    ParsedSymbol {
        option_type,
        contract,
    }
}

fn detect_option_type(symbol: &str) -> OptionType {
    if symbol.contains("CE") {
        OptionType::Ce
    } else if symbol.contains("PE") {
        OptionType::Pe
    } else {
        OptionType::Fut
    }
}

/// `SENSEX` `25` `8` `05` `88500`: root, year (ignored), month, day, strike
fn numeric_expiry_with_strike(s: &str) -> Option<Contract> {
    let mut cur = Cursor::new(s);
    let root = cur.letters()?;
    let _year = cur.digits(2)?;
    let month = cur.digits(1)?;
    let day = cur.digits(2)?;
    let strike = cur.rest_digits()?;

    Some(Contract {
        root: root.to_string(),
        expiry: Expiry::numeric(day.parse().ok()?, month.parse().ok()?),
        strike: Some(strike.parse().ok()?),
    })
}

/// `BANKEX` `25` `AUG` `65500`: root, day, month, strike
fn abbreviated_expiry_with_strike(s: &str) -> Option<Contract> {
    let mut cur = Cursor::new(s);
    let root = cur.letters()?;
    let expiry = cur.day_and_month()?;
    let strike = cur.rest_digits()?;

    Some(Contract {
        root: root.to_string(),
        expiry,
        strike: Some(strike.parse().ok()?),
    })
}

/// `CRUDEOILM` `25` `JUL`: root, day, month; no strike
fn abbreviated_expiry(s: &str) -> Option<Contract> {
    let mut cur = Cursor::new(s);
    let root = cur.letters()?;
    let expiry = cur.day_and_month()?;
    if !cur.is_empty() {
        return None;
    }

    Some(Contract {
        root: root.to_string(),
        expiry,
        strike: None,
    })
}

/// Left-to-right scanner over an ASCII symbol
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }

    fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    fn take_while(&mut self, max: usize, pred: impl Fn(u8) -> bool) -> &'a str {
        let len = self
            .rest
            .bytes()
            .take(max)
            .take_while(|b| pred(*b))
            .count();
        let (head, tail) = self.rest.split_at(len);
        self.rest = tail;
        head
    }

    /// One or more uppercase ASCII letters
    fn letters(&mut self) -> Option<&'a str> {
        let run = self.take_while(usize::MAX, |b| b.is_ascii_uppercase());
        (!run.is_empty()).then_some(run)
    }

    /// Exactly `n` digits
    fn digits(&mut self, n: usize) -> Option<&'a str> {
        let run = self.take_while(n, |b| b.is_ascii_digit());
        (run.len() == n).then_some(run)
    }

    /// Exactly `n` uppercase letters
    fn upper(&mut self, n: usize) -> Option<&'a str> {
        let run = self.take_while(n, |b| b.is_ascii_uppercase());
        (run.len() == n).then_some(run)
    }

    /// One or more digits running to the end of input
    fn rest_digits(&mut self) -> Option<&'a str> {
        let run = self.take_while(usize::MAX, |b| b.is_ascii_digit());
        (!run.is_empty() && self.rest.is_empty()).then_some(run)
    }

    fn day_and_month(&mut self) -> Option<Expiry> {
        let day: u8 = self.digits(2)?.parse().ok()?;
        let month = month_from_abbreviation(self.upper(3)?)?;
        Some(Expiry::abbreviated(day, month))
    }
}
