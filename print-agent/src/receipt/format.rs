//! Money and time formatting for receipts

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format a monetary amount with `.` thousands and `,` decimal separators
///
/// At most three fraction digits are kept and trailing zeros are dropped:
/// `1234567` → `1.234.567`, `12.5` → `12,5`.
pub fn format_price(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(3, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().to_string();

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (digits.as_str(), None),
    };

    let mut out = String::with_capacity(digits.len() + int_part.len() / 3 + 1);
    if negative {
        out.push('-');
    }
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

/// Format a quantity without trailing zeros (`2.0` → `2`, `0.5` → `0,5`)
pub fn format_quantity(value: Decimal) -> String {
    format_price(value)
}

/// Format a timestamp as `HH:mm` in the given time zone
///
/// Accepts RFC 3339, naive ISO-8601 (taken as UTC) and epoch milliseconds.
/// Empty input gives an empty string; anything unparsable is returned as is.
pub fn format_time(raw: &str, tz: Tz) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    match parse_timestamp(trimmed) {
        Some(dt) => dt.with_timezone(&tz).format("%H:%M").to_string(),
        None => raw.to_string(),
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(naive.and_utc());
    }

    s.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}
