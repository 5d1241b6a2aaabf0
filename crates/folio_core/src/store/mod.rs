//! Key-value store contracts and implementations.
//!
//! # Responsibility
//! - Define the get/set capability a reconciliation pass is given.
//! - Provide a SQLite-backed store and an in-memory store.
//!
//! # Invariants
//! - Keys are non-blank strings; values are opaque serialized text.
//! - `set` replaces the whole value for a key; there is no partial patch.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory_store;
pub mod sqlite_store;

pub use memory_store::MemoryKvStore;
pub use sqlite_store::SqliteKvStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store access error.
#[derive(Debug)]
pub enum StoreError {
    /// Key is empty or whitespace only.
    InvalidKey(String),
    /// Backing SQLite failure.
    Db(DbError),
    /// Backing table is absent; the connection was not migrated.
    MissingTable(&'static str),
    /// Backend refused the operation.
    Unavailable(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(f, "invalid store key: `{key}`"),
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingTable(table) => write!(f, "store table `{table}` does not exist"),
            Self::Unavailable(message) => write!(f, "store unavailable: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidKey(_) | Self::MissingTable(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Get/set capability over serialized values.
pub trait KvStore {
    /// Returns the stored value, or `None` when the key was never set.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;
    /// Overwrites the value stored for `key`.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

impl<T: KvStore + ?Sized> KvStore for &T {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }
}

impl<T: KvStore + ?Sized> KvStore for Box<T> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set(key, value)
    }
}

/// Trims and checks a store key.
pub(crate) fn normalize_key(key: &str) -> StoreResult<&str> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(trimmed)
}
