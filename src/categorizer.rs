use std::collections::HashSet;

use crate::aggregator::BaseStore;
use crate::models::{Pattern, TransactionRecord};

/// Records whose joined text matches `pattern`, in parse order.
///
/// The base store is already unique; duplicates are still dropped here so the
/// matcher stays safe on any record sequence.
pub fn match_category(pattern: &Pattern, base: &BaseStore) -> Vec<TransactionRecord> {
    match_records(pattern, base.in_parse_order())
}

pub fn match_records<'a>(
    pattern: &Pattern,
    records: impl IntoIterator<Item = &'a TransactionRecord>,
) -> Vec<TransactionRecord> {
    let mut seen = HashSet::new();
    let mut matched = Vec::new();
    for record in records {
        let text = record.fingerprint();
        if pattern.is_match(&text) && seen.insert(text) {
            matched.push(record.clone());
        }
    }
    matched
}
