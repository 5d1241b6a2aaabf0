//! Core logic for folio portfolio record reconciliation.
//! Finds records sharing an id, gives later holders fresh ids, flags records
//! missing an id or a name, and writes the corrected collection back.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod reconcile;
pub mod service;
pub mod store;

pub use config::{ConfigError, FolioConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::{Record, RecordKey};
pub use reconcile::codec::{decode_collection, encode_collection, DecodeError};
pub use reconcile::id_gen::IdSeed;
pub use reconcile::report::{
    CollectingReporter, LogReporter, Outcome, PassSummary, ReportEvent, Reporter,
};
pub use reconcile::validate::Diagnostic;
pub use reconcile::AuditEntry;
pub use service::reconcile_service::{
    PassOptions, PendingWrite, PersistError, ReconcileError, ReconcileService, DEFAULT_STORE_KEY,
};
pub use store::{KvStore, MemoryKvStore, SqliteKvStore, StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
