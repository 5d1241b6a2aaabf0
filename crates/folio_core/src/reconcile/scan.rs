//! Duplicate identifier scanner.
//!
//! # Invariants
//! - First record seen for a key is the canonical holder.
//! - Records without a present id are never registered and never collide.
//! - Pure: the collection is only read.

use crate::model::record::{Record, RecordKey};
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// One record whose id was already held by an earlier record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateHit {
    /// Position of the duplicate in the collection.
    pub index: usize,
    /// Position of the canonical holder.
    pub first_index: usize,
    pub original_id: RecordKey,
    pub first_record_name: Option<String>,
    pub duplicate_record_name: Option<String>,
}

/// Scanner output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub examined: usize,
    /// Duplicates in encounter order.
    pub duplicates: Vec<DuplicateHit>,
}

impl ScanReport {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// Classifies every record that repeats an earlier record's id.
pub fn scan_duplicates(records: &[Record]) -> ScanReport {
    let mut first_seen: HashMap<RecordKey, usize> = HashMap::with_capacity(records.len());
    let mut duplicates = Vec::new();

    for (index, record) in records.iter().enumerate() {
        let Some(key) = record.id() else {
            continue;
        };

        match first_seen.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(index);
            }
            Entry::Occupied(slot) => {
                let first_index = *slot.get();
                duplicates.push(DuplicateHit {
                    index,
                    first_index,
                    original_id: slot.key().clone(),
                    first_record_name: records[first_index].name().map(str::to_string),
                    duplicate_record_name: record.name().map(str::to_string),
                });
            }
        }
    }

    ScanReport {
        examined: records.len(),
        duplicates,
    }
}

#[cfg(test)]
mod tests {
    use super::scan_duplicates;
    use crate::model::record::{Record, RecordKey};
    use serde_json::json;

    fn records(value: serde_json::Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn unique_ids_have_no_duplicates() {
        let report = scan_duplicates(&records(json!([
            { "id": "1", "name": "Acme" },
            { "id": "2", "name": "Beta" },
        ])));
        assert_eq!(report.examined, 2);
        assert!(!report.has_duplicates());
    }

    #[test]
    fn later_records_are_duplicates_of_first_holder() {
        let report = scan_duplicates(&records(json!([
            { "id": "1", "name": "Acme" },
            { "id": "1", "name": "Beta" },
            { "id": "2", "name": "Gamma" },
            { "id": "1", "name": "Delta" },
        ])));

        let hits: Vec<(usize, usize, Option<&str>)> = report
            .duplicates
            .iter()
            .map(|hit| (hit.index, hit.first_index, hit.duplicate_record_name.as_deref()))
            .collect();
        assert_eq!(hits, vec![(1, 0, Some("Beta")), (3, 0, Some("Delta"))]);
        assert!(report
            .duplicates
            .iter()
            .all(|hit| hit.first_record_name.as_deref() == Some("Acme")
                && hit.original_id == RecordKey::from("1")));
    }

    #[test]
    fn missing_ids_never_collide() {
        let report = scan_duplicates(&records(json!([
            { "name": "A" },
            { "id": "", "name": "B" },
            { "id": null, "name": "C" },
            { "id": 0, "name": "D" },
            { "name": "E" },
        ])));
        assert!(!report.has_duplicates());
    }

    #[test]
    fn string_and_number_ids_are_distinct() {
        let report = scan_duplicates(&records(json!([
            { "id": "7", "name": "A" },
            { "id": 7, "name": "B" },
        ])));
        assert!(!report.has_duplicates());
    }

    #[test]
    fn numeric_ids_match_by_value_not_spelling() {
        let parsed: Vec<Record> = serde_json::from_str(
            r#"[
                { "id": 1, "name": "Acme" },
                { "id": 1.0, "name": "Beta" },
                { "id": 100, "name": "C" },
                { "id": 1e2, "name": "D" }
            ]"#,
        )
        .unwrap();
        let report = scan_duplicates(&parsed);

        let hits: Vec<(usize, usize, String)> = report
            .duplicates
            .iter()
            .map(|hit| (hit.index, hit.first_index, hit.original_id.to_string()))
            .collect();
        assert_eq!(
            hits,
            vec![(1, 0, "1".to_string()), (3, 2, "100".to_string())]
        );
    }
}
