//! Replacement identifier generation.
//!
//! A replacement id is the pass seed followed by the duplicate's collection
//! index, e.g. seed `1700000000000` and index `4` give `"17000000000004"`.
//! Uniqueness is best-effort across passes and strict within one collection:
//! a candidate that matches an existing or already assigned id gets a `-N`
//! suffix until it is free.

use crate::model::record::{Record, RecordKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Per-pass seed for replacement ids. Captured once per pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdSeed(u64);

impl IdSeed {
    /// Seed from the current wall clock in epoch milliseconds.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        Self(u64::try_from(millis).unwrap_or(u64::MAX))
    }

    pub fn fixed(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl Display for IdSeed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out replacement ids that clash with nothing in the collection.
///
/// Existing ids are compared by their textual form, so a text candidate is
/// also refused when a numeric id prints the same.
#[derive(Debug)]
pub struct IdAllocator {
    seed: IdSeed,
    taken: HashSet<String>,
}

impl IdAllocator {
    /// Builds an allocator that treats every present id in `records` as taken.
    pub fn new(seed: IdSeed, records: &[Record]) -> Self {
        let taken = records
            .iter()
            .filter_map(Record::id)
            .map(|key| key.to_string())
            .collect();
        Self { seed, taken }
    }

    /// Allocates the replacement id for the record at `index`.
    pub fn allocate(&mut self, index: usize) -> RecordKey {
        let base = format!("{}{}", self.seed, index);
        let mut candidate = base.clone();
        let mut attempt: u32 = 0;
        while self.taken.contains(&candidate) {
            attempt += 1;
            candidate = format!("{base}-{attempt}");
        }

        self.taken.insert(candidate.clone());
        RecordKey::Text(candidate)
    }
}
