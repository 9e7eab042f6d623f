//! Listing date validation.

use std::sync::OnceLock;

use chrono::{Months, NaiveDate};
use regex::Regex;

/// How far from today a listing date may be, in either direction.
const HORIZON: Months = Months::new(12);

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date regex"))
}

/// Validate a `YYYY-MM-DD` listing date against `today`.
///
/// Returns the input unchanged when it is a real calendar date no more than one
/// year before or after `today` (both bounds inclusive).
pub fn validate_date(raw: &str, today: NaiveDate) -> Option<&str> {
    if !date_pattern().is_match(raw) {
        return None;
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;

    // Month arithmetic clamps Feb 29 to Feb 28 instead of drifting by a day.
    let earliest = today.checked_sub_months(HORIZON)?;
    let latest = today.checked_add_months(HORIZON)?;

    if date < earliest || date > latest {
        return None;
    }

    Some(raw)
}

/// Format a date the way listing dates are written.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
