//! Bookmark comparison
//!
//! Bookmarks are stored as the strings the API returned and compared as
//! instants. Values that do not parse as date-times sort before every value
//! that does, and among themselves as plain strings.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use std::cmp::Ordering;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a bookmark value; offset-less values are taken as UTC
pub fn parse_bookmark(value: &str) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).fixed_offset())
}

/// Order two bookmark values; unparseable values are the oldest
pub fn compare_bookmarks(a: &str, b: &str) -> Ordering {
    match (parse_bookmark(a), parse_bookmark(b)) {
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// The earlier of two bookmarks; ties keep `a`
pub fn min_bookmark<'a>(a: &'a str, b: &'a str) -> &'a str {
    if compare_bookmarks(b, a) == Ordering::Less {
        b
    } else {
        a
    }
}
