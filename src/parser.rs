use std::str::FromStr;

use regex::Regex;
use rust_decimal::Decimal;

use crate::error::{GiroError, Result};
use crate::models::{SignFilter, TransactionRecord, YearFilter};

pub const FIELD_COUNT: usize = 17;
pub const HEADER_FIRST_FIELD: &str = "Auftragskonto";
pub const PENDING_MARKER: &str = "Umsatz vorgemerkt";
pub const COMMENT_MARKER: char = '#';

// Zero-based positions inside a normalized CAMT-V2 row.
const VALUE_DATE: usize = 2;
const BOOKING_TEXT: usize = 3;
const PURPOSE: usize = 4;
const COUNTERPARTY_NAME: usize = 11;
const COUNTERPARTY_ACCOUNT: usize = 12;
const AMOUNT: usize = 14;
const STATUS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Blank,
    Comment,
    Header,
    Pending,
    OtherYear,
    Sign,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
    Record(TransactionRecord),
    Skip(SkipReason),
}

/// Turns raw CAMT-V2 lines into records for one year and sign.
pub struct RecordParser {
    year: YearFilter,
    sign: SignFilter,
    date_re: Regex,
    space_re: Regex,
    separator_re: Regex,
}

impl RecordParser {
    pub fn new(year: YearFilter, sign: SignFilter) -> Self {
        Self {
            year,
            sign,
            date_re: Regex::new(r"^[0-3][0-9]\.[0-1][0-9]\.[0-9]{2}$").expect("static regex"),
            space_re: Regex::new(r"\s+").expect("static regex"),
            separator_re: Regex::new(r" ?; ?").expect("static regex"),
        }
    }

    /// Strip a byte order mark and quotes, collapse whitespace and the blanks around separators, trim.
    pub fn normalize(&self, raw: &str) -> String {
        let unquoted = strip_bom(raw).replace('"', "");
        let spaced = self.space_re.replace_all(&unquoted, " ");
        let separated = self.separator_re.replace_all(&spaced, ";");
        separated.trim().to_string()
    }

    pub fn parse_line(&self, file: &str, raw: &str) -> Result<Parsed> {
        let trimmed = strip_bom(raw).trim();
        if trimmed.is_empty() {
            return Ok(Parsed::Skip(SkipReason::Blank));
        }
        if trimmed.starts_with(COMMENT_MARKER) {
            return Ok(Parsed::Skip(SkipReason::Comment));
        }

        let line = self.normalize(raw);
        let fields: Vec<&str> = line.split(';').collect();
        if fields[0] == HEADER_FIRST_FIELD {
            return Ok(Parsed::Skip(SkipReason::Header));
        }
        if fields.len() != FIELD_COUNT {
            return Err(GiroError::FieldCount {
                file: file.to_string(),
                found: fields.len(),
                line: raw.to_string(),
            });
        }
        if fields[STATUS] == PENDING_MARKER {
            return Ok(Parsed::Skip(SkipReason::Pending));
        }

        let date = fields[VALUE_DATE];
        if !self.date_re.is_match(date) {
            return Err(GiroError::MalformedDate {
                file: file.to_string(),
                date: date.to_string(),
                line: raw.to_string(),
            });
        }
        if !self.year.matches(date) {
            return Ok(Parsed::Skip(SkipReason::OtherYear));
        }

        let amount = parse_amount(fields[AMOUNT]).ok_or_else(|| GiroError::MalformedAmount {
            file: file.to_string(),
            amount: fields[AMOUNT].to_string(),
            line: raw.to_string(),
        })?;
        if !self.sign.keeps(amount) {
            return Ok(Parsed::Skip(SkipReason::Sign));
        }

        Ok(Parsed::Record(TransactionRecord {
            posting_date: date.to_string(),
            booking_text: fields[BOOKING_TEXT].to_string(),
            purpose: fields[PURPOSE].to_string(),
            counterparty_name: fields[COUNTERPARTY_NAME].to_string(),
            counterparty_account: fields[COUNTERPARTY_ACCOUNT].to_string(),
            amount,
        }))
    }
}

/// Exports saved by spreadsheet tools start with U+FEFF.
pub fn strip_bom(line: &str) -> &str {
    line.strip_prefix('\u{feff}').unwrap_or(line)
}

/// Decimal comma to decimal dot; negative zero folds to zero.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let mut value = Decimal::from_str(&raw.trim().replace(',', ".")).ok()?;
    if value.is_zero() {
        value.set_sign_positive(true);
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const ROW: &str = r#""K1";"01.01.24";"01.01.24";"UMBUCHUNG";"grundsteuer moosach";"";"";"";"";"";"";"Acme";"DE123";"BIC1";"-22,97";"EUR";"Umsatz gebucht""#;

    fn parser(sign: SignFilter) -> RecordParser {
        RecordParser::new(YearFilter::new(2024).unwrap(), sign)
    }

    fn record(parsed: Parsed) -> TransactionRecord {
        match parsed {
            Parsed::Record(r) => r,
            other => panic!("expected record, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_valid_row() {
        let r = record(parser(SignFilter::Negative).parse_line("f.csv", ROW).unwrap());
        assert_eq!(r.posting_date, "01.01.24");
        assert_eq!(r.booking_text, "UMBUCHUNG");
        assert_eq!(r.purpose, "grundsteuer moosach");
        assert_eq!(r.counterparty_name, "Acme");
        assert_eq!(r.counterparty_account, "DE123");
        assert_eq!(r.amount, dec!(-22.97));
    }

    #[test]
    fn test_normalize_collapses_noise() {
        let p = parser(SignFilter::All);
        assert_eq!(
            p.normalize("  \"a\"  ;  \"b   c\"\t;\"d\"  "),
            "a;b c;d"
        );
    }

    #[test]
    fn test_noisy_row_parses_to_same_record() {
        let noisy = ROW.replace("\"UMBUCHUNG\"", "  \"UMBUCHUNG\"   ").replace("grundsteuer moosach", "grundsteuer    moosach");
        let p = parser(SignFilter::All);
        let a = record(p.parse_line("f.csv", ROW).unwrap());
        let b = record(p.parse_line("f.csv", &noisy).unwrap());
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_skips_blank_comment_header_pending() {
        let p = parser(SignFilter::All);
        assert_eq!(p.parse_line("f", "   ").unwrap(), Parsed::Skip(SkipReason::Blank));
        assert_eq!(p.parse_line("f", "# export").unwrap(), Parsed::Skip(SkipReason::Comment));
        let header = r#""Auftragskonto";"Buchungstag";"Valutadatum";"Buchungstext""#;
        assert_eq!(p.parse_line("f", header).unwrap(), Parsed::Skip(SkipReason::Header));
        let pending = ROW.replace("Umsatz gebucht", "Umsatz vorgemerkt");
        assert_eq!(p.parse_line("f", &pending).unwrap(), Parsed::Skip(SkipReason::Pending));
    }

    #[test]
    fn test_header_after_byte_order_mark_is_skipped() {
        let p = parser(SignFilter::All);
        let header = format!("\u{feff}{}", r#""Auftragskonto";"Buchungstag";"Valutadatum""#);
        assert_eq!(p.parse_line("f", &header).unwrap(), Parsed::Skip(SkipReason::Header));
        assert_eq!(p.parse_line("f", "\u{feff}# export").unwrap(), Parsed::Skip(SkipReason::Comment));
        let r = record(p.parse_line("f", &format!("\u{feff}{ROW}")).unwrap());
        assert_eq!(r.posting_date, "01.01.24");
    }

    #[test]
    fn test_wrong_field_count_is_fatal() {
        let short = ROW.replace(";\"EUR\"", "");
        let err = parser(SignFilter::All).parse_line("giro-1.csv", &short).unwrap_err();
        match err {
            GiroError::FieldCount { file, found, line } => {
                assert_eq!(file, "giro-1.csv");
                assert_eq!(found, 16);
                assert_eq!(line, short);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_malformed_date_is_fatal() {
        let p = parser(SignFilter::All);
        for bad in ["2024-01-01", "41.01.24", "01.21.24", "1.1.24"] {
            let row = ROW.replacen("\"01.01.24\";\"UMBUCHUNG\"", &format!("\"{bad}\";\"UMBUCHUNG\""), 1);
            assert!(
                matches!(p.parse_line("f", &row), Err(GiroError::MalformedDate { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_other_year_is_dropped() {
        let row = ROW.replace("01.01.24", "31.12.23");
        assert_eq!(
            parser(SignFilter::All).parse_line("f", &row).unwrap(),
            Parsed::Skip(SkipReason::OtherYear)
        );
    }

    #[test]
    fn test_sign_filter_applied() {
        assert_eq!(
            parser(SignFilter::Positive).parse_line("f", ROW).unwrap(),
            Parsed::Skip(SkipReason::Sign)
        );
        let zero = ROW.replace("-22,97", "0,00");
        let r = record(parser(SignFilter::Positive).parse_line("f", &zero).unwrap());
        assert_eq!(r.amount, Decimal::ZERO);
        assert_eq!(
            parser(SignFilter::Negative).parse_line("f", &zero).unwrap(),
            Parsed::Skip(SkipReason::Sign)
        );
    }

    #[test]
    fn test_malformed_amount_is_fatal() {
        let row = ROW.replace("-22,97", "zwölf");
        assert!(matches!(
            parser(SignFilter::All).parse_line("f", &row),
            Err(GiroError::MalformedAmount { .. })
        ));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("-22,97"), Some(dec!(-22.97)));
        assert_eq!(parse_amount("1500,00"), Some(dec!(1500)));
        assert_eq!(parse_amount("-0,00").map(|d| d.is_sign_negative()), Some(false));
        assert_eq!(parse_amount(""), None);
    }
}
