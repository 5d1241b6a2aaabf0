//! Ordered schema steps for the store database.
//!
//! Each step is plain SQL bundled at compile time. Steps above the file's
//! `user_version` run together inside one transaction, and the header is
//! bumped after each step so a failure rolls the whole upgrade back.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

struct Step {
    version: u32,
    name: &'static str,
    up: &'static str,
}

const STEPS: &[Step] = &[Step {
    version: 1,
    name: "kv_store",
    up: include_str!("0001_kv_store.sql"),
}];

/// Schema version a freshly opened database ends up at.
pub fn target_version() -> u32 {
    STEPS.iter().map(|step| step.version).max().unwrap_or(0)
}

/// Reads the schema version stamped in the database header.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Brings `conn` up to `target_version()`.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = schema_version(conn)?;
    let target = target_version();
    if found > target {
        return Err(DbError::SchemaTooNew {
            found,
            supported: target,
        });
    }

    let mut pending = STEPS.iter().filter(|step| step.version > found).peekable();
    if pending.peek().is_none() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        debug!(
            "event=db_migrate_step module=db version={} name={}",
            step.version, step.name
        );
        tx.execute_batch(step.up)?;
        tx.pragma_update(None, "user_version", step.version)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        found, target
    );
    Ok(())
}
