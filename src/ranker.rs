use rust_decimal::Decimal;

use crate::aggregator::BaseStore;
use crate::error::{GiroError, Result};
use crate::models::TransactionRecord;
use crate::reports::render_table;

pub struct RankedResult {
    pub title: String,
    pub threshold: i64,
    pub records: Vec<TransactionRecord>,
}

/// Records at or beyond `threshold`, ascending by amount.
///
/// Positive thresholds select `amount >= threshold`, negative ones `amount <= threshold`.
pub fn rank(base: &BaseStore, threshold: i64) -> Result<Vec<TransactionRecord>> {
    if threshold == 0 {
        return Err(GiroError::ZeroThreshold);
    }
    let limit = Decimal::from(threshold);
    let mut sorted: Vec<TransactionRecord> = base.records().to_vec();
    sorted.sort_by(|a, b| a.amount.cmp(&b.amount));
    Ok(sorted
        .into_iter()
        .filter(|r| {
            if threshold > 0 {
                r.amount >= limit
            } else {
                r.amount <= limit
            }
        })
        .collect())
}

/// `Schwelle<L>-<year>_alle`
pub fn title(threshold: i64, year: i32) -> String {
    format!("Schwelle{threshold}-{year}_alle")
}

/// `None` when nothing crosses the threshold.
pub fn build_ranking(base: &BaseStore, threshold: i64) -> Result<Option<RankedResult>> {
    let records = rank(base, threshold)?;
    if records.is_empty() {
        return Ok(None);
    }
    Ok(Some(RankedResult {
        title: title(threshold, base.year.year()),
        threshold,
        records,
    }))
}

/// Same layout as category tables; the trailer carries the count only.
pub fn render_ranking_table(ranked: &RankedResult) -> String {
    let trailer = format!("{} Buchungen", ranked.records.len());
    render_table(&ranked.title, &ranked.records, &trailer)
}
