use crate::data::ProjectRecord;
use std::collections::HashMap;
use std::fmt;

/// The two toggleable flow categories
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FlowCategory {
    /// Official development assistance
    #[default]
    Oda,
    /// Other official flows
    Oof,
}

impl FlowCategory {
    pub const ALL: [FlowCategory; 2] = [FlowCategory::Oda, FlowCategory::Oof];

    /// Tag as it appears in the `Flow Type` column
    pub fn tag(self) -> &'static str {
        match self {
            FlowCategory::Oda => "ODA",
            FlowCategory::Oof => "OOF",
        }
    }
}

impl fmt::Display for FlowCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Canonical form of a country identifier: trimmed and uppercased.
///
/// Absent stays absent so that a missing identifier can never match anything.
/// Both the geography keys and the record keys go through this function.
pub fn normalize_key(raw: Option<&str>) -> Option<String> {
    raw.map(|s| s.trim().to_uppercase())
}

/// Project counts per normalized country key for one category.
///
/// Every stored count is at least 1; countries without records are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategoryCountMap {
    counts: HashMap<String, u32>,
    /// Matching records whose recipient key was absent (never looked up)
    unkeyed: u32,
}

impl CategoryCountMap {
    pub fn get(&self, key: &str) -> Option<u32> {
        self.counts.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&v| v as u64).sum()
    }

    pub fn unkeyed(&self) -> u32 {
        self.unkeyed
    }

    pub fn max_count(&self) -> Option<u32> {
        self.counts.values().copied().max()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.counts.iter().map(|(k, &v)| (k.as_str(), v))
    }
}

/// Count records of `category` per normalized recipient key
pub fn aggregate(records: &[ProjectRecord], category: FlowCategory) -> CategoryCountMap {
    let mut map = CategoryCountMap::default();

    for record in records
        .iter()
        .filter(|r| r.flow_type.as_deref() == Some(category.tag()))
    {
        match normalize_key(record.recipient_key.as_deref()) {
            Some(key) => *map.counts.entry(key).or_insert(0) += 1,
            None => map.unkeyed += 1,
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(flow: &str, key: Option<&str>) -> ProjectRecord {
        ProjectRecord {
            flow_type: Some(flow.to_string()),
            recipient_key: key.map(str::to_string),
        }
    }

    #[test]
    fn test_normalize_trims_and_uppercases() {
        assert_eq!(normalize_key(Some("  ken ")), Some("KEN".to_string()));
        assert_eq!(normalize_key(Some("Usa")), Some("USA".to_string()));
        assert_eq!(normalize_key(None), None);
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in ["ken", " KeN\t", "\n usa  ", "", "   ", "côte"] {
            let once = normalize_key(Some(raw));
            let twice = normalize_key(once.as_deref());
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }

    #[test]
    fn test_whitespace_only_is_empty_not_absent() {
        assert_eq!(normalize_key(Some("   ")), Some(String::new()));
    }

    #[test]
    fn test_aggregate_scenario() {
        let records = vec![
            record("ODA", Some("ken")),
            record("ODA", Some("KEN")),
            record("OOF", Some("usa")),
        ];

        let oda = aggregate(&records, FlowCategory::Oda);
        assert_eq!(oda.len(), 1);
        assert_eq!(oda.get("KEN"), Some(2));
        assert_eq!(oda.get("USA"), None);

        let oof = aggregate(&records, FlowCategory::Oof);
        assert_eq!(oof.get("USA"), Some(1));
        assert_eq!(oof.get("KEN"), None);
    }

    #[test]
    fn test_total_equals_keyed_matching_records() {
        let records = vec![
            record("ODA", Some("ken")),
            record("ODA", None),
            record("ODA", Some(" tza")),
            record("ODA", Some("TZA")),
            record("OOF", Some("ken")),
            record("oda", Some("ken")),
            ProjectRecord { flow_type: None, recipient_key: Some("KEN".into()) },
        ];

        let oda = aggregate(&records, FlowCategory::Oda);
        let expected = records
            .iter()
            .filter(|r| r.flow_type.as_deref() == Some("ODA") && r.recipient_key.is_some())
            .count() as u64;
        assert_eq!(oda.total(), expected);
        assert_eq!(oda.unkeyed(), 1);
        assert!(oda.iter().all(|(_, v)| v >= 1));
    }

    #[test]
    fn test_aggregate_empty() {
        let map = aggregate(&[], FlowCategory::Oof);
        assert!(map.is_empty());
        assert_eq!(map.max_count(), None);
    }

    #[test]
    fn test_aggregate_deterministic() {
        let records = vec![
            record("OOF", Some("chn")),
            record("OOF", Some("bra")),
            record("OOF", Some("CHN")),
        ];
        assert_eq!(
            aggregate(&records, FlowCategory::Oof),
            aggregate(&records, FlowCategory::Oof)
        );
    }
}
