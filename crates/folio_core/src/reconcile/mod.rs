//! Entity-identity reconciliation stages.
//!
//! # Responsibility
//! - Scan a collection for repeated ids (`scan`).
//! - Reassign ids of later duplicates and record audit entries.
//! - Report records missing an id or a name (`validate`).
//! - Encode/decode the stored collection (`codec`).
//!
//! # Invariants
//! - The first holder of an id keeps it; only later holders are remapped.
//! - Reassignment touches the `id` field only.
//! - After reassignment no two records share a present id.

use crate::model::record::{Record, RecordKey};
use serde::Serialize;

pub mod codec;
pub mod id_gen;
pub mod report;
pub mod scan;
pub mod validate;

use id_gen::{IdAllocator, IdSeed};
use scan::ScanReport;

/// Transient record of one id reassignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    /// Position of the remapped record.
    pub index: usize,
    /// Position of the record that kept `original_id`.
    pub first_index: usize,
    pub original_id: RecordKey,
    pub first_record_name: Option<String>,
    pub duplicate_record_name: Option<String>,
    pub assigned_id: RecordKey,
}

/// Assigns a fresh id to every duplicate found by `scan` and returns one
/// audit entry per reassignment, in encounter order.
///
/// `scan` must have been produced from `records` in their current state.
pub fn reconcile_duplicates(
    records: &mut [Record],
    scan: &ScanReport,
    seed: IdSeed,
) -> Vec<AuditEntry> {
    if !scan.has_duplicates() {
        return Vec::new();
    }

    let mut allocator = IdAllocator::new(seed, records);
    let mut audit = Vec::with_capacity(scan.duplicates.len());

    for hit in &scan.duplicates {
        let assigned_id = allocator.allocate(hit.index);
        records[hit.index].set_id(&assigned_id);
        audit.push(AuditEntry {
            index: hit.index,
            first_index: hit.first_index,
            original_id: hit.original_id.clone(),
            first_record_name: hit.first_record_name.clone(),
            duplicate_record_name: hit.duplicate_record_name.clone(),
            assigned_id,
        });
    }

    audit
}
