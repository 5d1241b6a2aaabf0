//! SQLite-backed key-value store.
//!
//! # Invariants
//! - The connection must come from `db::open_db*` so `kv_entries` exists.
//! - `set` is an upsert that refreshes `updated_at`.

use super::{normalize_key, KvStore, StoreError, StoreResult};
use log::{debug, error};
use rusqlite::{params, Connection, OptionalExtension};

const KV_TABLE: &str = "kv_entries";

/// Key-value store over the `kv_entries` table.
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    /// Wraps a connection without checking its schema.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after checking that the backing table exists.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [KV_TABLE],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(StoreError::MissingTable(KV_TABLE));
        }
        Ok(Self::new(conn))
    }

    /// Returns all stored keys in ascending order.
    pub fn keys(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_entries ORDER BY key ASC;")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(keys)
    }
}

impl KvStore for SqliteKvStore<'_> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let key = normalize_key(key)?;
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        debug!(
            "event=kv_get module=store status=ok found={} bytes={}",
            value.is_some(),
            value.as_ref().map_or(0, String::len)
        );
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let key = normalize_key(key)?;
        let result = self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        );

        match result {
            Ok(_) => {
                debug!(
                    "event=kv_set module=store status=ok bytes={}",
                    value.len()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=kv_set module=store status=error error_code=kv_write_failed error={}",
                    err
                );
                Err(err.into())
            }
        }
    }
}
