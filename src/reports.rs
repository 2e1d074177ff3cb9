use rust_decimal::Decimal;

use crate::aggregator::BaseStore;
use crate::categorizer::match_category;
use crate::error::{GiroError, Result};
use crate::fmt::{amount, column, truncate};
use crate::models::{CategorySpec, SignFilter, TransactionRecord};

pub const CSV_HEADER: [&str; 5] = ["Datum", "Buchungstext", "Verwendungszweck", "Korrespondent", "Betrag"];

// Fixed-width table columns.
const DATE_W: usize = 8;
const BOOKING_W: usize = 25;
const PURPOSE_W: usize = 90;
const NAME_W: usize = 65;
const ACCOUNT_W: usize = 22;
const AMOUNT_W: usize = 12;
const LEFT_W: usize = DATE_W + BOOKING_W + PURPOSE_W + NAME_W + ACCOUNT_W + 4;

pub const TABLE_WIDTH: usize = LEFT_W + 1 + AMOUNT_W;

/// Header length in the printable document.
pub const DOCUMENT_HEADER_MAX: usize = 80;

pub struct ReportResult {
    pub title: String,
    pub header: String,
    pub records: Vec<TransactionRecord>,
    pub sum: Decimal,
    pub count: usize,
}

/// `<base-title>-<year>_<sign>`
pub fn compose_title(base_title: &str, year: i32, sign: SignFilter) -> String {
    format!("{base_title}-{year}_{}", sign.label())
}

/// Global header beats the category header, which beats the title.
pub fn resolve_header(title: &str, category_header: Option<&str>, global_header: Option<&str>) -> String {
    global_header
        .filter(|h| !h.trim().is_empty())
        .or(category_header.filter(|h| !h.trim().is_empty()))
        .unwrap_or(title)
        .to_string()
}

/// Match `spec` against the base set and total the result. `None` when nothing matched.
pub fn build_report(
    spec: &CategorySpec,
    base: &BaseStore,
    global_header: Option<&str>,
) -> Option<ReportResult> {
    let records = match_category(&spec.pattern, base);
    if records.is_empty() {
        return None;
    }
    let title = compose_title(&spec.title, base.year.year(), base.sign);
    let header = resolve_header(&title, spec.header.as_deref(), global_header);
    let sum = records.iter().map(|r| r.amount).sum();
    let count = records.len();
    Some(ReportResult {
        title,
        header,
        records,
        sum,
        count,
    })
}

/// Machine-readable projection; the counterparty account is left out.
pub fn render_csv(report: &ReportResult) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;
    for r in &report.records {
        wtr.write_record([
            r.posting_date.as_str(),
            r.booking_text.as_str(),
            r.purpose.as_str(),
            r.counterparty_name.as_str(),
            amount(r.amount).as_str(),
        ])?;
    }
    let count = format!("{} Buchungen", report.count);
    let total = amount(report.sum);
    wtr.write_record(["Summe", count.as_str(), "", "", total.as_str()])?;
    let bytes = wtr
        .into_inner()
        .map_err(|e| GiroError::Other(format!("CSV buffer: {e}")))?;
    String::from_utf8(bytes).map_err(|e| GiroError::Other(format!("CSV encoding: {e}")))
}

pub fn table_row(r: &TransactionRecord) -> String {
    format!(
        "{} {} {} {} {} {:>AMOUNT_W$}",
        column(&r.posting_date, DATE_W),
        column(&r.booking_text, BOOKING_W),
        column(&r.purpose, PURPOSE_W),
        column(&r.counterparty_name, NAME_W),
        column(&r.counterparty_account, ACCOUNT_W),
        amount(r.amount),
    )
}

fn table_head() -> String {
    format!(
        "{} {} {} {} {} {:>AMOUNT_W$}",
        column("Datum", DATE_W),
        column("Buchungstext", BOOKING_W),
        column("Verwendungszweck", PURPOSE_W),
        column("Korrespondent", NAME_W),
        column("Konto", ACCOUNT_W),
        "Betrag",
    )
}

/// Fixed-width table: title, column head, rows, and the given trailer line.
pub fn render_table(title: &str, records: &[TransactionRecord], trailer: &str) -> String {
    let rule = "-".repeat(TABLE_WIDTH);
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    out.push_str(&table_head());
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');
    for r in records {
        out.push_str(&table_row(r));
        out.push('\n');
    }
    out.push_str(&rule);
    out.push('\n');
    out.push_str(trailer);
    out.push('\n');
    out
}

pub fn render_report_table(report: &ReportResult) -> String {
    let trailer = format!(
        "{:<LEFT_W$} {:>AMOUNT_W$}",
        format!("{} Buchungen, Summe", report.count),
        amount(report.sum),
    );
    render_table(&report.title, &report.records, &trailer)
}

/// Header as printed on top of the document.
pub fn document_header(report_header: &str) -> String {
    truncate(report_header, DOCUMENT_HEADER_MAX)
}
