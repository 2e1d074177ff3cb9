use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};
use rust_decimal::Decimal;

use crate::error::{GiroError, Result};
use crate::fmt::amount;

/// One booked transaction, as parsed from a CAMT-V2 row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub posting_date: String,
    pub booking_text: String,
    pub purpose: String,
    pub counterparty_name: String,
    pub counterparty_account: String,
    pub amount: Decimal,
}

impl TransactionRecord {
    /// Deduplication key and the text categories are matched against.
    pub fn fingerprint(&self) -> String {
        format!(
            "{};{};{};{};{};{}",
            self.posting_date,
            self.booking_text,
            self.purpose,
            self.counterparty_name,
            self.counterparty_account,
            amount(self.amount),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignFilter {
    Positive,
    Negative,
    All,
}

impl SignFilter {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "positiv",
            Self::Negative => "negativ",
            Self::All => "alle",
        }
    }

    /// Zero counts as positive.
    pub fn keeps(&self, value: Decimal) -> bool {
        match self {
            Self::Positive => value >= Decimal::ZERO,
            Self::Negative => value < Decimal::ZERO,
            Self::All => true,
        }
    }
}

impl FromStr for SignFilter {
    type Err = GiroError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "positiv" | "positive" | "+" => Ok(Self::Positive),
            "negativ" | "negative" | "-" => Ok(Self::Negative),
            "alle" | "all" => Ok(Self::All),
            _ => Err(GiroError::UnknownSign(s.to_string())),
        }
    }
}

impl fmt::Display for SignFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Selects records by the two-digit year suffix of their value date.
///
/// There is no century handling: `24` matches both 2024 and 1924.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearFilter {
    year: i32,
    suffix: String,
}

impl YearFilter {
    pub fn new(year: i32) -> Result<Self> {
        if !(1000..=9999).contains(&year) {
            return Err(GiroError::InvalidYear(year));
        }
        Ok(Self {
            year,
            suffix: format!("{:02}", year % 100),
        })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn matches(&self, date: &str) -> bool {
        date.ends_with(&self.suffix)
    }
}

/// Pattern values that label a category as "everything in the base set".
pub const SENTINEL_INCOMING: &str = "@eingaenge";
pub const SENTINEL_OUTGOING: &str = "@ausgaenge";
pub const SENTINEL_ALL: &str = "@alle";

#[derive(Debug, Clone)]
pub enum Pattern {
    /// One of the sentinels: every record of the base set.
    Everything,
    Regex(Regex),
}

impl Pattern {
    pub fn compile(title: &str, source: &str) -> Result<Self> {
        if [SENTINEL_INCOMING, SENTINEL_OUTGOING, SENTINEL_ALL].contains(&source) {
            return Ok(Self::Everything);
        }
        RegexBuilder::new(source)
            .case_insensitive(true)
            .build()
            .map(Self::Regex)
            .map_err(|source| GiroError::InvalidPattern {
                title: title.to_string(),
                source,
            })
    }

    /// Unanchored search, not a full match.
    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Self::Everything => true,
            Self::Regex(re) => re.is_match(text),
        }
    }
}

/// A named classification rule.
#[derive(Debug, Clone)]
pub struct CategorySpec {
    pub title: String,
    pub pattern: Pattern,
    pub header: Option<String>,
}

impl CategorySpec {
    pub fn new(title: &str, pattern: &str, header: Option<&str>) -> Result<Self> {
        Ok(Self {
            title: title.to_string(),
            pattern: Pattern::compile(title, pattern)?,
            header: header.map(str::to_string),
        })
    }
}
