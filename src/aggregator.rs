use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::error::{GiroError, Result};
use crate::models::{SignFilter, TransactionRecord, YearFilter};
use crate::parser::{Parsed, RecordParser, SkipReason};

/// One statement export, identified by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFile {
    pub path: PathBuf,
    pub account: String,
    pub from: String,
    pub to: String,
}

impl StatementFile {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

fn file_name_re() -> Regex {
    Regex::new(r"^giro-(?P<account>.+)-(?P<from>\d{8})-(?P<to>\d{8})\.camtv2\.csv$")
        .expect("static regex")
}

pub fn parse_file_name(path: &Path) -> Option<StatementFile> {
    let name = path.file_name()?.to_str()?;
    let caps = file_name_re().captures(name)?;
    Some(StatementFile {
        path: path.to_path_buf(),
        account: caps["account"].to_string(),
        from: caps["from"].to_string(),
        to: caps["to"].to_string(),
    })
}

/// Statement files for `account` in `dir`, later end dates first.
pub fn discover(dir: &Path, account: &str) -> Result<Vec<StatementFile>> {
    let mut files: Vec<StatementFile> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| parse_file_name(&entry.path()))
        .filter(|f| f.account == account)
        .collect();
    if files.is_empty() {
        return Err(GiroError::NoInputFiles {
            account: account.to_string(),
            dir: dir.display().to_string(),
        });
    }
    files.sort_by(|a, b| {
        b.to.cmp(&a.to)
            .then_with(|| b.from.cmp(&a.from))
            .then_with(|| a.name().cmp(&b.name()))
    });
    Ok(files)
}

/// The deduplicated records of one aggregation run. Never mutated after construction.
///
/// Records are stored in reverse insertion order: the line parsed last comes first.
#[derive(Debug, Clone)]
pub struct BaseStore {
    pub account: String,
    pub year: YearFilter,
    pub sign: SignFilter,
    records: Vec<TransactionRecord>,
}

impl BaseStore {
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// Records in the order they were first parsed.
    pub fn in_parse_order(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.records.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// First line of the base file.
    pub fn oldest(&self) -> Option<&TransactionRecord> {
        self.records.first()
    }

    /// Last line of the base file.
    pub fn newest(&self) -> Option<&TransactionRecord> {
        self.records.last()
    }

    pub fn sum(&self) -> Decimal {
        self.records.iter().map(|r| r.amount).sum()
    }

    /// `basis-<account>-<year>_<sign>.csv`
    pub fn file_name(&self) -> String {
        format!("basis-{}-{}_{}.csv", self.account, self.year.year(), self.sign.label())
    }

    /// Flat re-exportable form: one fingerprint line per record, storage order.
    pub fn to_base_file(&self) -> String {
        let mut out = String::new();
        for r in &self.records {
            out.push_str(&r.fingerprint());
            out.push('\n');
        }
        out
    }
}

/// Order-preserving set keyed by fingerprint; the first occurrence wins.
#[derive(Default)]
pub struct UniqueRecords {
    seen: HashSet<String>,
    records: Vec<TransactionRecord>,
}

impl UniqueRecords {
    pub fn insert(&mut self, record: TransactionRecord) -> bool {
        if self.seen.insert(record.fingerprint()) {
            self.records.push(record);
            true
        } else {
            false
        }
    }

    pub fn into_vec(self) -> Vec<TransactionRecord> {
        self.records
    }
}

#[derive(Default)]
struct FileStats {
    records: usize,
    duplicates: usize,
    other_year: usize,
    sign: usize,
    pending: usize,
}

/// Parse every file in the given order and collapse duplicates across all of them.
pub fn aggregate(
    files: &[StatementFile],
    account: &str,
    year: YearFilter,
    sign: SignFilter,
) -> Result<BaseStore> {
    let parser = RecordParser::new(year.clone(), sign);
    let mut unique = UniqueRecords::default();

    for file in files {
        let name = file.name();
        let bytes = std::fs::read(&file.path)?;
        let content =
            String::from_utf8(bytes).map_err(|_| GiroError::Encoding { file: name.clone() })?;

        let mut stats = FileStats::default();
        for line in content.lines() {
            match parser.parse_line(&name, line)? {
                Parsed::Record(record) => {
                    if unique.insert(record) {
                        stats.records += 1;
                    } else {
                        stats.duplicates += 1;
                    }
                }
                Parsed::Skip(SkipReason::OtherYear) => stats.other_year += 1,
                Parsed::Skip(SkipReason::Sign) => stats.sign += 1,
                Parsed::Skip(SkipReason::Pending) => stats.pending += 1,
                Parsed::Skip(_) => {}
            }
        }
        debug!(
            "Parsed {name}: {} new, {} duplicates, {} other year, {} other sign, {} pending",
            stats.records, stats.duplicates, stats.other_year, stats.sign, stats.pending
        );
    }

    let mut records = unique.into_vec();
    if records.is_empty() {
        return Err(GiroError::EmptyBase {
            account: account.to_string(),
            year: year.year(),
            sign: sign.label().to_string(),
        });
    }
    records.reverse();

    let base = BaseStore {
        account: account.to_string(),
        year,
        sign,
        records,
    };
    info!(
        "Base for {} {} ({}): {} records",
        base.account,
        base.year.year(),
        base.sign,
        base.len()
    );
    Ok(base)
}

/// Discover and aggregate in one step.
pub fn load_base(dir: &Path, account: &str, year: YearFilter, sign: SignFilter) -> Result<BaseStore> {
    let files = discover(dir, account)?;
    aggregate(&files, account, year, sign)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// A CAMT-V2 row with the given value date, purpose and amount.
    pub(crate) fn row(date: &str, purpose: &str, amount: &str) -> String {
        format!(
            "\"K1\";\"{date}\";\"{date}\";\"UMBUCHUNG\";\"{purpose}\";\"\";\"\";\"\";\"\";\"\";\"\";\"Acme\";\"DE123\";\"BIC1\";\"{amount}\";\"EUR\";\"Umsatz gebucht\""
        )
    }

    pub(crate) const HEADER: &str = "\"Auftragskonto\";\"Buchungstag\";\"Valutadatum\";\"Buchungstext\";\"Verwendungszweck\";\"Glaeubiger ID\";\"Mandatsreferenz\";\"Kundenreferenz (End-to-End)\";\"Sammlerreferenz\";\"Lastschrift Ursprungsbetrag\";\"Auslagenersatz Ruecklastschrift\";\"Beguenstigter/Zahlungspflichtiger\";\"Kontonummer/IBAN\";\"BIC (SWIFT-Code)\";\"Betrag\";\"Waehrung\";\"Info\"";

    pub(crate) fn write_statement(dir: &Path, account: &str, from: &str, to: &str, rows: &[String]) -> PathBuf {
        let path = dir.join(format!("giro-{account}-{from}-{to}.camtv2.csv"));
        let mut content = format!("{HEADER}\n");
        for r in rows {
            content.push_str(r);
            content.push('\n');
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    fn year() -> YearFilter {
        YearFilter::new(2024).unwrap()
    }

    #[test]
    fn test_discover_sorts_by_end_date_descending() {
        let dir = tempfile::tempdir().unwrap();
        write_statement(dir.path(), "1", "20240101", "20240331", &[]);
        write_statement(dir.path(), "1", "20240401", "20241231", &[]);
        write_statement(dir.path(), "1", "20230101", "20240630", &[]);
        write_statement(dir.path(), "2", "20240101", "20251231", &[]);
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = discover(dir.path(), "1").unwrap();
        let ends: Vec<&str> = files.iter().map(|f| f.to.as_str()).collect();
        assert_eq!(ends, vec!["20241231", "20240630", "20240331"]);
    }

    #[test]
    fn test_discover_without_files_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover(dir.path(), "1"),
            Err(GiroError::NoInputFiles { .. })
        ));
    }

    #[test]
    fn test_parse_file_name_with_dashed_account() {
        let f = parse_file_name(Path::new("/x/giro-DE12-3456-20240101-20241231.camtv2.csv")).unwrap();
        assert_eq!(f.account, "DE12-3456");
        assert_eq!(f.from, "20240101");
        assert_eq!(f.to, "20241231");
        assert!(parse_file_name(Path::new("giro-1-2024-2025.csv")).is_none());
    }

    #[test]
    fn test_duplicates_across_files_appear_once() {
        let dir = tempfile::tempdir().unwrap();
        let shared = row("15.03.24", "Miete Moosach", "950,00");
        write_statement(dir.path(), "1", "20240101", "20240331", &[shared.clone(), shared.clone()]);
        write_statement(dir.path(), "1", "20240101", "20240630", &[shared.clone(), row("01.06.24", "Strom", "-80,00")]);

        let base = load_base(dir.path(), "1", year(), SignFilter::All).unwrap();
        assert_eq!(base.len(), 2);
        let count = base
            .records()
            .iter()
            .filter(|r| r.purpose == "Miete Moosach")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_quoting_noise_collapses_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let clean = row("15.03.24", "Miete Moosach", "950,00");
        let noisy = clean.replace("\"Miete Moosach\"", "  \"Miete   Moosach\" ").replace("\"K1\"", "K1");
        write_statement(dir.path(), "1", "20240101", "20240331", &[clean, noisy]);
        let base = load_base(dir.path(), "1", year(), SignFilter::All).unwrap();
        assert_eq!(base.len(), 1);
    }

    #[test]
    fn test_emission_is_reverse_of_parse_order() {
        let dir = tempfile::tempdir().unwrap();
        // The later file is read first.
        write_statement(dir.path(), "1", "20240401", "20240630", &[
            row("20.06.24", "B", "-2,00"),
            row("10.04.24", "A", "-1,00"),
        ]);
        write_statement(dir.path(), "1", "20240101", "20240331", &[row("05.01.24", "C", "-3,00")]);

        let base = load_base(dir.path(), "1", year(), SignFilter::All).unwrap();
        let purposes: Vec<&str> = base.records().iter().map(|r| r.purpose.as_str()).collect();
        assert_eq!(purposes, vec!["C", "A", "B"]);
        assert_eq!(base.oldest().unwrap().purpose, "C");
        assert_eq!(base.newest().unwrap().purpose, "B");
        let parsed: Vec<&str> = base.in_parse_order().map(|r| r.purpose.as_str()).collect();
        assert_eq!(parsed, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_format_error_aborts_whole_run() {
        let dir = tempfile::tempdir().unwrap();
        let short = row("15.03.24", "Miete", "950,00").replace(";\"EUR\"", "");
        write_statement(dir.path(), "1", "20240101", "20240331", &[row("01.01.24", "ok", "1,00"), short]);
        let err = load_base(dir.path(), "1", year(), SignFilter::All).unwrap_err();
        assert!(matches!(err, GiroError::FieldCount { found: 16, .. }));
        assert!(err.to_string().contains("giro-1-20240101-20240331.camtv2.csv"));
    }

    #[test]
    fn test_empty_base_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_statement(dir.path(), "1", "20230101", "20231231", &[row("01.01.23", "alt", "1,00")]);
        assert!(matches!(
            load_base(dir.path(), "1", year(), SignFilter::All),
            Err(GiroError::EmptyBase { year: 2024, .. })
        ));
    }

    #[test]
    fn test_non_utf8_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("giro-1-20240101-20241231.camtv2.csv");
        std::fs::write(&path, b"\"K1\";\"Gr\xfcnwald\"\n").unwrap();
        assert!(matches!(
            load_base(dir.path(), "1", year(), SignFilter::All),
            Err(GiroError::Encoding { .. })
        ));
    }

    #[test]
    fn test_sign_partition_sums() {
        let dir = tempfile::tempdir().unwrap();
        write_statement(dir.path(), "1", "20240101", "20241231", &[
            row("01.01.24", "a", "100,00"),
            row("02.01.24", "b", "-40,50"),
            row("03.01.24", "c", "0,00"),
            row("04.01.24", "d", "-0,01"),
        ]);
        let all = load_base(dir.path(), "1", year(), SignFilter::All).unwrap();
        let pos = load_base(dir.path(), "1", year(), SignFilter::Positive).unwrap();
        let neg = load_base(dir.path(), "1", year(), SignFilter::Negative).unwrap();
        assert_eq!(all.sum(), pos.sum() + neg.sum());
        assert_eq!(all.len(), pos.len() + neg.len());
        assert_eq!(pos.len(), 2, "zero amount counts as positive");
        assert_eq!(neg.sum(), dec!(-40.51));
    }

    #[test]
    fn test_base_file_lines_follow_storage_order() {
        let dir = tempfile::tempdir().unwrap();
        write_statement(dir.path(), "1", "20240101", "20241231", &[
            row("02.01.24", "zweite", "-2,00"),
            row("01.01.24", "erste", "-1,00"),
        ]);
        let base = load_base(dir.path(), "1", year(), SignFilter::Negative).unwrap();
        assert_eq!(base.file_name(), "basis-1-2024_negativ.csv");
        let text = base.to_base_file();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "01.01.24;UMBUCHUNG;erste;Acme;DE123;-1.00");
        assert_eq!(lines[1], "02.01.24;UMBUCHUNG;zweite;Acme;DE123;-2.00");
    }
}
