// src/timestamp.rs
//! Feed timestamp parsing. Feeds in the wild mix RFC 2822, RFC 3339 and a
//! handful of zone-less layouts; everything is normalized to UTC seconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use time::{
    format_description::well_known::{Rfc2822, Rfc3339},
    OffsetDateTime, UtcOffset,
};

// ISO layouts with a compact `+hhmm` offset, which RFC 3339 rejects.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M:%S%z"];

// Zone-less layouts are read as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

/// Parse a published timestamp into a UTC instant with second precision.
/// Returns `None` for empty or unrecognized input.
pub fn parse_feed_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let unix = parse_well_known(s).or_else(|| parse_lenient(s))?;
    DateTime::from_timestamp(unix, 0)
}

fn parse_well_known(s: &str) -> Option<i64> {
    OffsetDateTime::parse(s, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(s, &Rfc3339))
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
}

fn parse_lenient(s: &str) -> Option<i64> {
    // chrono accepts obsolete zone names (GMT, EST, ...) and two-digit years.
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.timestamp());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(ndt.and_utc().timestamp());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| ndt.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn rfc2822_with_gmt_zone() {
        assert_eq!(
            parse_feed_timestamp("Wed, 03 Jan 2024 08:00:00 GMT"),
            Some(utc(2024, 1, 3, 8, 0, 0))
        );
    }

    #[test]
    fn numeric_offset_is_converted_to_utc() {
        // 01:30 in Taipei is the previous day in UTC.
        assert_eq!(
            parse_feed_timestamp("Mon, 08 Jan 2024 01:30:00 +0800"),
            Some(utc(2024, 1, 7, 17, 30, 0))
        );
    }

    #[test]
    fn iso_with_compact_offset() {
        assert_eq!(
            parse_feed_timestamp("2024-01-03T08:00:00+0800"),
            Some(utc(2024, 1, 3, 0, 0, 0))
        );
        assert_eq!(
            parse_feed_timestamp("2024-01-03T08:00:00.250-0130"),
            Some(utc(2024, 1, 3, 9, 30, 0))
        );
    }

    #[test]
    fn rfc3339_drops_fractional_seconds() {
        assert_eq!(
            parse_feed_timestamp("2024-01-05T10:20:30.987Z"),
            Some(utc(2024, 1, 5, 10, 20, 30))
        );
    }

    #[test]
    fn zone_less_layouts_are_read_as_utc() {
        assert_eq!(
            parse_feed_timestamp("2024-01-05 10:20:30"),
            Some(utc(2024, 1, 5, 10, 20, 30))
        );
        assert_eq!(parse_feed_timestamp("2024-01-05"), Some(utc(2024, 1, 5, 0, 0, 0)));
    }

    #[test]
    fn garbage_and_blank_are_rejected() {
        assert_eq!(parse_feed_timestamp(""), None);
        assert_eq!(parse_feed_timestamp("   "), None);
        assert_eq!(parse_feed_timestamp("yesterday-ish"), None);
    }
}
