//! In-memory key-value store.
//!
//! Used by tests and by hosts that keep the collection in process. Supports
//! write-failure injection so persistence error paths can be exercised.

use super::{normalize_key, KvStore, StoreError, StoreResult};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RefCell<BTreeMap<String, String>>,
    fail_writes: Cell<bool>,
    write_count: Cell<usize>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with one entry.
    pub fn with_entry(key: &str, value: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .entries
            .borrow_mut()
            .insert(key.trim().to_string(), value.into());
        store
    }

    /// Makes every following `set` fail with `StoreError::Unavailable`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Number of successful `set` calls.
    pub fn write_count(&self) -> usize {
        self.write_count.get()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let key = normalize_key(key)?;
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let key = normalize_key(key)?;
        if self.fail_writes.get() {
            return Err(StoreError::Unavailable(format!(
                "writes disabled for key `{key}`"
            )));
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        self.write_count.set(self.write_count.get() + 1);
        Ok(())
    }
}
