//! Free-form date and time parsing.
//!
//! Source feeds mix ISO dates, slashed month-first and day-first dates, and
//! named-month layouts such as `January 1951 27`. Every value is tried
//! against a fixed list of layouts; anything that matches none of them is
//! the missing marker, never an error.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Date layouts, tried in order. Month-first wins over day-first for
/// ambiguous slashed dates.
const DATE_FORMATS: [&str; 20] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y %m %d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%Y%m%d",
    "%B %Y %d",  // January 1951 27
    "%Y %B %d",  // 2005 January 27
    "%B %d %Y",  // January 27 2005
    "%B %d, %Y", // January 27, 2005
    "%d %B %Y",  // 27 January 2005
    "%d-%b-%Y",  // 27-Jan-2005
    "%Y-%b-%d",  // 2005-Jan-27
    "%b %Y %d",
    "%Y %b %d",
    "%b %d, %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
];

const DATETIME_FORMATS: [&str; 11] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d-%b-%Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
];

/// Calendar representation a column is normalized to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    Date,
    Datetime,
}

/// A successfully parsed calendar value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporal {
    Date(NaiveDate),
    Datetime(NaiveDateTime),
}

/// Parses heterogeneous date/time strings into chrono values.
pub struct TemporalNormalizer;

impl TemporalNormalizer {
    /// Normalize `value` to the requested kind, or `None` if unparsable.
    pub fn normalize(value: &str, kind: TemporalKind) -> Option<Temporal> {
        match kind {
            TemporalKind::Date => Self::parse_date(value).map(Temporal::Date),
            TemporalKind::Datetime => Self::parse_datetime(value).map(Temporal::Datetime),
        }
    }

    /// Parse a calendar date. Full timestamps are accepted and truncated to their date.
    pub fn parse_date(value: &str) -> Option<NaiveDate> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
            .or_else(|| Self::try_datetime_formats(trimmed).map(|dt| dt.date()))
    }

    /// Parse a timestamp. A bare date is taken at midnight.
    pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        Self::try_datetime_formats(trimmed).or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .map(|d| d.and_time(NaiveTime::MIN))
        })
    }

    /// Build a date from separate year, month and day fields.
    ///
    /// The fields are joined into ISO form and reparsed, so an impossible
    /// combination such as 31 April is `None`.
    pub fn compose_date(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
        let iso = format!("{}-{}-{}", year.trim(), month.trim(), day.trim());
        NaiveDate::parse_from_str(&iso, "%Y-%m-%d").ok()
    }

    /// Combine a composed date with a time-of-day string in a second parse.
    pub fn compose_datetime(date: NaiveDate, time: &str) -> Option<NaiveDateTime> {
        let combined = format!("{} {}", date.format("%Y-%m-%d"), time.trim());
        Self::try_datetime_formats(&combined)
    }

    fn try_datetime_formats(value: &str) -> Option<NaiveDateTime> {
        DATETIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
    }
}
