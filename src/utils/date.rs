//! Publish-date parsing and formatting.
//!
//! Every date in the pipeline is a UTC `NaiveDateTime`. The stored string
//! form is `full_date` (`2024-03-01 00:00:00-00:00`), which sorts
//! lexicographically in chronological order and is accepted back by
//! [`parse_date`] alongside the usual ISO forms.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Sortable stored form, e.g. `2024-03-01 00:00:00-00:00`.
pub const FULL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S-00:00";
/// Human-readable form, e.g. `March 01, 2024`.
pub const LONG_DATE_FORMAT: &str = "%B %d, %Y";
/// ISO-8601 without offset, e.g. `2024-03-01T00:00:00`.
pub const XML_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Archive path fragment, e.g. `2024/03`.
pub const ARCHIVE_DATE_FORMAT: &str = "%Y/%m";

/// Naive formats tried in order after the offset-aware ones.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse any supported date string into UTC.
///
/// Accepts RFC 3339, the stored `full_date` form, ISO date-times with or
/// without fractional seconds, and bare `YYYY-MM-DD` dates.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_utc());
    }

    // "-00:00" means "offset unknown"; treat it as UTC
    let naive = s
        .strip_suffix("-00:00")
        .or_else(|| s.strip_suffix('Z'))
        .unwrap_or(s);

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(naive, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// UNIX seconds to UTC.
pub fn from_timestamp(secs: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

/// Split a `YYYY-MM-DD-slug` file stem into its date and slug.
///
/// Returns `None` when the stem has no valid leading date. The slug is
/// empty for a bare `YYYY-MM-DD` stem.
pub fn split_dated_stem(stem: &str) -> Option<(NaiveDate, &str)> {
    let head = stem.get(..10)?;
    let date = NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()?;
    match &stem[10..] {
        "" => Some((date, "")),
        rest => rest.strip_prefix('-').map(|slug| (date, slug)),
    }
}

/// A resolved publish date with the formats the pipeline needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PublishDate(pub NaiveDateTime);

impl PublishDate {
    pub fn from_ymd(date: NaiveDate) -> Option<Self> {
        date.and_hms_opt(0, 0, 0).map(Self)
    }

    pub fn full_date(&self) -> String {
        self.0.format(FULL_DATE_FORMAT).to_string()
    }

    pub fn long_date(&self) -> String {
        self.0.format(LONG_DATE_FORMAT).to_string()
    }

    pub fn rfc2822(&self) -> String {
        Utc.from_utc_datetime(&self.0).to_rfc2822()
    }

    pub fn rfc3339(&self) -> String {
        Utc.from_utc_datetime(&self.0).to_rfc3339()
    }

    /// `(YYYY, MM, DD)` zero-padded, used for url segments and date buckets.
    pub fn ymd(&self) -> (String, String, String) {
        (
            format!("{:04}", self.0.year()),
            format!("{:02}", self.0.month()),
            format!("{:02}", self.0.day()),
        )
    }
}
