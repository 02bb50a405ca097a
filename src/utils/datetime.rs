//! Date/time helpers for blob timestamps
//!
//! Listing timestamps are normalised to RFC 3339 strings in UTC so they
//! render and serialize the same way regardless of the backend.

use crate::error::{BlobscoutError, Result};
use chrono::{DateTime, NaiveDate, Utc};

/// Format a unix timestamp (seconds) as RFC 3339 in UTC
pub fn format_timestamp(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Parse ISO 8601 date/datetime strings
/// Supported formats:
/// - "2021-03-09" (date only, start of day UTC)
/// - "2021-03-09T19:00:00Z"
/// - "2021-03-09T19:00:00+01:00"
pub fn parse_iso_datetime(input: &str) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(BlobscoutError::invalid_argument(format!(
        "Invalid date format: '{}'. Expected RFC 3339 (2021-03-09T19:00:00Z) or YYYY-MM-DD",
        input
    )))
}

/// Parse a timestamp produced by [`format_timestamp`]
pub fn parse_property_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp_round_trips() {
        let formatted = format_timestamp(1_615_316_400);
        assert_eq!(formatted, "2021-03-09T19:00:00+00:00");
        assert_eq!(
            parse_property_time(&formatted).map(|dt| dt.timestamp()),
            Some(1_615_316_400)
        );
    }

    #[test]
    fn test_parse_iso_datetime_formats() {
        let full = parse_iso_datetime("2021-03-09T19:00:00Z").unwrap();
        assert_eq!(full.timestamp(), 1_615_316_400);

        let offset = parse_iso_datetime("2021-03-09T20:00:00+01:00").unwrap();
        assert_eq!(offset, full);

        let date_only = parse_iso_datetime("2021-03-09").unwrap();
        assert_eq!(date_only.timestamp(), 1_615_248_000);
    }

    #[test]
    fn test_parse_iso_datetime_rejects_garbage() {
        assert!(parse_iso_datetime("yesterday").is_err());
        assert!(parse_property_time("not a time").is_none());
    }
}
