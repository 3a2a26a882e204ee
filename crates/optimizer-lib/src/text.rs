//! Number rendering for user-facing messages

/// Float with at least one decimal place, e.g. `48.0` or `3.6`
pub fn decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// Whole-dollar amount with comma grouping, e.g. `59,400`.
/// Rounds to whole dollars before grouping, so `999.5` prints as `1,000`.
pub fn thousands(amount: f64) -> String {
    let rounded = format!("{:.0}", amount.abs());
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, digit) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if amount < 0.0 && grouped != "0" {
        grouped.insert(0, '-');
    }
    grouped
}
