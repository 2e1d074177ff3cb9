//! Preprocessing for the older 11-column CSV-MT940 export.
//!
//! The legacy rows lack the six SEPA reference columns that CAMT-V2 carries after
//! the purpose field. Inserting six empty fields there aligns every column.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{GiroError, Result};
use crate::output::write_atomic;
use crate::parser::{strip_bom, COMMENT_MARKER, FIELD_COUNT, HEADER_FIRST_FIELD};

pub const LEGACY_FIELD_COUNT: usize = 11;
const INSERT_AFTER: usize = 5;
const INSERTED: usize = FIELD_COUNT - LEGACY_FIELD_COUNT;

pub const CAMT_HEADER: &str = "\"Auftragskonto\";\"Buchungstag\";\"Valutadatum\";\"Buchungstext\";\"Verwendungszweck\";\"Glaeubiger ID\";\"Mandatsreferenz\";\"Kundenreferenz (End-to-End)\";\"Sammlerreferenz\";\"Lastschrift Ursprungsbetrag\";\"Auslagenersatz Ruecklastschrift\";\"Beguenstigter/Zahlungspflichtiger\";\"Kontonummer/IBAN\";\"BIC (SWIFT-Code)\";\"Betrag\";\"Waehrung\";\"Info\"";

/// Convert one legacy line. Comments and blank lines pass through unchanged.
pub fn convert_line(file: &str, line: &str) -> Result<String> {
    let trimmed = strip_bom(line).trim();
    if trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) {
        return Ok(line.to_string());
    }
    let fields: Vec<&str> = strip_bom(line).split(';').collect();
    if fields[0].trim().trim_matches('"') == HEADER_FIRST_FIELD {
        return Ok(CAMT_HEADER.to_string());
    }
    if fields.len() != LEGACY_FIELD_COUNT {
        return Err(GiroError::FieldCount {
            file: file.to_string(),
            found: fields.len(),
            line: line.to_string(),
        });
    }
    let mut out: Vec<&str> = Vec::with_capacity(FIELD_COUNT);
    out.extend_from_slice(&fields[..INSERT_AFTER]);
    out.extend(std::iter::repeat("\"\"").take(INSERTED));
    out.extend_from_slice(&fields[INSERT_AFTER..]);
    Ok(out.join(";"))
}

pub fn convert_text(file: &str, content: &str) -> Result<String> {
    let mut out = String::new();
    for line in content.lines() {
        out.push_str(&convert_line(file, line)?);
        out.push('\n');
    }
    Ok(out)
}

/// `giro-1-20200101-20201231.csv` -> `giro-1-20200101-20201231.camtv2.csv`
pub fn default_output(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = name.strip_suffix(".csv").unwrap_or(&name);
    input.with_file_name(format!("{stem}.camtv2.csv"))
}

/// Convert a whole file; nothing is written if any line is malformed.
pub fn convert_file(input: &Path, output: &Path) -> Result<usize> {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let bytes = std::fs::read(input)?;
    let content = String::from_utf8(bytes).map_err(|_| GiroError::Encoding { file: name.clone() })?;
    let converted = convert_text(&name, &content)?;
    write_atomic(output, converted.as_bytes())?;
    let lines = converted.lines().count();
    debug!("Converted {name}: {lines} lines");
    Ok(lines)
}
