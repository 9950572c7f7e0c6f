// src/stats.rs
//! Source frequency table over a result set.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::model::NewsRecord;

/// Ordered `source -> count`, most frequent first. Equal counts keep the
/// order in which the sources first appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStats {
    entries: Vec<(String, usize)>,
}

impl SourceStats {
    pub fn from_records(records: &[NewsRecord]) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut entries: Vec<(String, usize)> = Vec::new();
        for r in records {
            match index.get(r.source.as_str()) {
                Some(&i) => entries[i].1 += 1,
                None => {
                    index.insert(r.source.as_str(), entries.len());
                    entries.push((r.source.clone(), 1));
                }
            }
        }
        // Stable sort keeps first-appearance order among ties.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        Self { entries }
    }

    pub fn entries(&self) -> &[(String, usize)] {
        &self.entries
    }

    pub fn get(&self, source: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, n)| *n)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|(_, n)| n).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Serialized as a JSON object; key order follows `entries`.
impl Serialize for SourceStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (source, count) in &self.entries {
            map.serialize_entry(source, count)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SearchTerm;
    use chrono::{TimeZone, Utc};

    fn rec(source: &str) -> NewsRecord {
        NewsRecord {
            title: String::new(),
            link: String::new(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            source: source.into(),
            matched_term: SearchTerm::new("t"),
        }
    }

    #[test]
    fn counts_descending_with_first_seen_tie_break() {
        let records = vec![rec("B"), rec("A"), rec("C"), rec("A"), rec("C"), rec("D")];
        let stats = SourceStats::from_records(&records);
        let order: Vec<_> = stats.entries().iter().map(|(s, n)| (s.as_str(), *n)).collect();
        assert_eq!(order, vec![("A", 2), ("C", 2), ("B", 1), ("D", 1)]);
        assert_eq!(stats.total(), records.len());
        assert_eq!(stats.get("C"), Some(2));
        assert_eq!(stats.get("Z"), None);
    }

    #[test]
    fn serializes_as_ordered_object() {
        let stats = SourceStats::from_records(&[rec("x"), rec("y"), rec("y")]);
        assert_eq!(serde_json::to_string(&stats).unwrap(), r#"{"y":2,"x":1}"#);
        assert_eq!(serde_json::to_string(&SourceStats::default()).unwrap(), "{}");
    }
}
