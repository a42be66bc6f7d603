//! Core data types for the climate query service.
//!
//! This module defines the shared domain model imported by all other modules:
//! station rows, the records each query produces, the
//! ISO date helpers the query layer relies on, and the error taxonomy.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Storage format of every `measurement.date` value.
///
/// The format is fixed-width and zero-padded, so comparing two formatted
/// dates as strings gives the same answer as comparing them as dates. The
/// query layer depends on this when filtering in SQL.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Length of the trailing window used by the precipitation and temperature
/// series, in days.
pub const DEFAULT_WINDOW_DAYS: u32 = 365;

fn is_iso_shaped(value: &str) -> bool {
    value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parses caller-supplied `YYYY-MM-DD` input.
///
/// Rejects anything that is not exactly ten characters of zero-padded digits
/// or that names a day which does not exist (`2017-02-30`).
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, QueryError> {
    if !is_iso_shaped(value) {
        return Err(QueryError::MalformedInput(value.to_string()));
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| QueryError::MalformedInput(value.to_string()))
}

/// Parses a date read back from the dataset. A failure here means the
/// dataset itself is bad, not the request.
pub fn parse_stored_date(value: &str) -> Result<NaiveDate, QueryError> {
    parse_iso_date(value).map_err(|_| QueryError::CorruptDate(value.to_string()))
}

pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// First day of the inclusive window `[last - window_days, last]`.
pub fn window_start(last: NaiveDate, window_days: u32) -> NaiveDate {
    last.checked_sub_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MIN)
}

/// Validated bounds for a min/avg/max temperature query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    /// `None` means open-ended: every date from `start` onwards.
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn parse(start: &str, end: Option<&str>) -> Result<Self, QueryError> {
        let start = parse_iso_date(start)?;
        let end = end.map(parse_iso_date).transpose()?;
        Ok(DateRange { start, end })
    }
}

// ---------------------------------------------------------------------------
// Dataset rows
// ---------------------------------------------------------------------------

/// One row of the `station` table.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: i64,
    /// Station code, e.g. "USC00519397". Unique across the table.
    pub station: String,
    /// `None` when the row has no name.
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
}

// ---------------------------------------------------------------------------
// Query results
// ---------------------------------------------------------------------------

/// A single entry of the trailing precipitation series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RainfallRecord {
    pub date: String,
    /// Serialized as `null` when the day has no precipitation reading.
    pub rainfall: Option<f64>,
}

/// MIN / AVG / MAX of `tobs` over a date range.
///
/// All three are `None` when no row with a temperature matched the range;
/// that is a valid answer rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TemperatureStats {
    pub min: Option<f64>,
    pub avg: Option<f64>,
    pub max: Option<f64>,
}

/// The station with the most temperature observations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MostActiveStation {
    pub station: String,
    pub observations: i64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while opening or querying the climate dataset.
#[derive(Debug, Error)]
pub enum QueryError {
    /// An aggregate that needs at least one row (latest date, most active
    /// station) found none.
    #[error("No data available: {0}")]
    NoData(&'static str),

    /// A caller-supplied date is not a valid `YYYY-MM-DD` calendar date.
    #[error("Malformed date '{0}': expected YYYY-MM-DD")]
    MalformedInput(String),

    /// The dataset file could not be opened.
    #[error("Dataset unavailable at '{}'", .path.display())]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// A query against an open dataset failed.
    #[error("Query failed: {0}")]
    Storage(#[from] rusqlite::Error),

    /// A table or column the service depends on is missing.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A stored date does not follow `YYYY-MM-DD`.
    #[error("Dataset contains malformed date '{0}'")]
    CorruptDate(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date_accepts_zero_padded_dates() {
        let date = parse_iso_date("2017-08-23").expect("well-formed date should parse");
        assert_eq!(date, NaiveDate::from_ymd_opt(2017, 8, 23).unwrap());
    }

    #[test]
    fn test_parse_iso_date_rejects_unpadded_month() {
        // "2017-8-23" would compare greater than "2017-12-01" as a string,
        // so it must never reach the SQL filter.
        assert!(matches!(
            parse_iso_date("2017-8-23"),
            Err(QueryError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_parse_iso_date_rejects_impossible_day() {
        assert!(matches!(
            parse_iso_date("2017-02-30"),
            Err(QueryError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_parse_iso_date_rejects_garbage_and_empty() {
        for input in ["", "yesterday", "2017/08/23", "20170823", "2017-08-23T00:00"] {
            assert!(
                parse_iso_date(input).is_err(),
                "'{}' should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_parse_stored_date_reports_corruption_not_bad_input() {
        assert!(matches!(
            parse_stored_date("08/23/2017"),
            Err(QueryError::CorruptDate(_))
        ));
    }

    #[test]
    fn test_window_start_spans_365_days_across_leap_year() {
        // 2016 is a leap year, so 365 days before 2017-08-23 is 2016-08-23.
        let last = NaiveDate::from_ymd_opt(2017, 8, 23).unwrap();
        assert_eq!(format_iso_date(window_start(last, 365)), "2016-08-23");

        let last = NaiveDate::from_ymd_opt(2016, 8, 23).unwrap();
        assert_eq!(format_iso_date(window_start(last, 365)), "2015-08-24");
    }

    #[test]
    fn test_window_start_zero_days_is_the_same_day() {
        let last = NaiveDate::from_ymd_opt(2010, 1, 1).unwrap();
        assert_eq!(window_start(last, 0), last);
    }

    #[test]
    fn test_date_range_parse_open_ended() {
        let range = DateRange::parse("2017-01-01", None).expect("should parse");
        assert_eq!(range.end, None);
    }

    #[test]
    fn test_date_range_parse_rejects_bad_end() {
        let err = DateRange::parse("2017-01-01", Some("2017-13-01")).unwrap_err();
        assert_eq!(err.to_string(), "Malformed date '2017-13-01': expected YYYY-MM-DD");
    }

    #[test]
    fn test_formatted_dates_sort_like_dates() {
        let earlier = format_iso_date(NaiveDate::from_ymd_opt(2016, 9, 1).unwrap());
        let later = format_iso_date(NaiveDate::from_ymd_opt(2016, 10, 1).unwrap());
        assert!(earlier < later);
    }

    #[test]
    fn test_rainfall_record_serializes_missing_precipitation_as_null() {
        let record = RainfallRecord {
            date: "2017-08-23".to_string(),
            rainfall: None,
        };
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"date":"2017-08-23","rainfall":null}"#
        );
    }
}
