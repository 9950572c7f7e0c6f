// src/model.rs
//! Core data types shared by the planner, workers and the aggregator.

use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};

/// Source name substituted when a feed entry carries none.
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Format used for `publishedAt` on the wire.
pub const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One query string dispatched to the feed source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SearchTerm(String);

impl SearchTerm {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How comma-separated keywords turn into search terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombinationMode {
    /// Every keyword is its own term; results are unioned.
    #[default]
    Or,
    /// All keywords joined into one term; the feed resolves the intersection.
    And,
}

impl FromStr for CombinationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OR" => Ok(Self::Or),
            "AND" => Ok(Self::And),
            other => Err(anyhow!("unsupported logic '{other}', expected OR or AND")),
        }
    }
}

impl fmt::Display for CombinationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Or => f.write_str("OR"),
            Self::And => f.write_str("AND"),
        }
    }
}

/// Inclusive date range. Callers guarantee `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A single item as it came out of a feed document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    /// Timestamp text exactly as published (RFC 2822, RFC 3339, ...).
    pub published: Option<String>,
    pub source: Option<String>,
}

/// Normalized, immutable representation of one accepted feed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    pub title: String,
    pub link: String,
    #[serde(serialize_with = "serialize_published_at")]
    pub published_at: DateTime<Utc>,
    pub source: String,
    pub matched_term: SearchTerm,
}

fn serialize_published_at<S: Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&ts.format(PUBLISHED_AT_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("or".parse::<CombinationMode>().unwrap(), CombinationMode::Or);
        assert_eq!(" AND ".parse::<CombinationMode>().unwrap(), CombinationMode::And);
        assert!("XOR".parse::<CombinationMode>().is_err());
    }

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let w = DateWindow::new(d(1), d(7));
        assert!(w.contains(d(1)));
        assert!(w.contains(d(7)));
        assert!(!w.contains(d(8)));
        assert!(!w.contains(NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
    }

    #[test]
    fn record_serializes_with_wire_field_names() {
        let rec = NewsRecord {
            title: "t".into(),
            link: "https://example.test/a".into(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 3, 8, 5, 9).unwrap(),
            source: UNKNOWN_SOURCE.into(),
            matched_term: SearchTerm::new("Apple"),
        };
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["publishedAt"], "2024-01-03 08:05:09");
        assert_eq!(v["matchedTerm"], "Apple");
        assert_eq!(v["source"], "unknown");
    }
}
