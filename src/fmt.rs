use rust_decimal::Decimal;

/// Format an amount with a dot and exactly two decimals: -1234.50
pub fn amount(val: Decimal) -> String {
    let rounded = val.round_dp(2);
    if rounded.is_zero() {
        return "0.00".to_string();
    }
    format!("{rounded:.2}")
}

/// Cut `s` to at most `max` characters without splitting a UTF-8 sequence.
pub fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Truncate and left-align into a column of exactly `width` characters.
pub fn column(s: &str, width: usize) -> String {
    format!("{:<width$}", truncate(s, width))
}
