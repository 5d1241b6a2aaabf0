//! Reconciliation pass service.
//!
//! # Responsibility
//! - Run one load -> scan -> reassign -> validate -> persist pass against an
//!   injected store, reporting to an injected reporter.
//!
//! # Invariants
//! - Nothing is written unless at least one duplicate was reassigned.
//! - A write replaces the whole collection under the key.
//! - A decode failure aborts before any mutation or write.
//! - The reporter always receives exactly one final outcome.
//! - Audit entries reach the reporter only after a successful write, or in a
//!   dry run. A failed write carries them in `PendingWrite` instead.

use crate::model::record::Record;
use crate::reconcile::codec::{decode_collection, encode_collection, DecodeError};
use crate::reconcile::id_gen::IdSeed;
use crate::reconcile::report::{Outcome, PassSummary, Reporter};
use crate::reconcile::scan::scan_duplicates;
use crate::reconcile::validate::validate_records;
use crate::reconcile::{reconcile_duplicates, AuditEntry};
use crate::store::{KvStore, StoreError};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

/// Store key the portfolio tracker keeps its companies under.
pub const DEFAULT_STORE_KEY: &str = "portfolioCompanies";

/// Per-pass switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOptions {
    /// Run every stage but skip the write.
    pub dry_run: bool,
    /// Fixed seed for replacement ids; wall clock when `None`.
    pub seed: Option<IdSeed>,
}

/// Reassigned collection that did not reach the store.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub collection: Vec<Record>,
    pub audit: Vec<AuditEntry>,
}

/// Fatal pass error.
#[derive(Debug)]
pub enum ReconcileError {
    /// Store `get` failed.
    StoreRead(StoreError),
    /// Stored value is not a collection.
    Decode(DecodeError),
    /// Collection could not be serialized for writing.
    Encode(serde_json::Error),
    /// Store `set` failed; the reassigned collection is returned unpersisted.
    StoreWrite {
        source: StoreError,
        pending: Box<PendingWrite>,
    },
}

impl ReconcileError {
    /// Returns the unpersisted collection of a failed write.
    pub fn pending_write(&self) -> Option<&PendingWrite> {
        match self {
            Self::StoreWrite { pending, .. } => Some(pending.as_ref()),
            _ => None,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::StoreRead(_) => "store_read_failed",
            Self::Decode(_) => "decode_failed",
            Self::Encode(_) => "encode_failed",
            Self::StoreWrite { .. } => "store_write_failed",
        }
    }
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StoreRead(err) => write!(f, "failed to read collection: {err}"),
            Self::Decode(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode collection: {err}"),
            Self::StoreWrite { source, pending } => write!(
                f,
                "failed to save collection, {} id fixes did not take effect: {source}",
                pending.audit.len()
            ),
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StoreRead(err) => Some(err),
            Self::Decode(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::StoreWrite { source, .. } => Some(source),
        }
    }
}

impl From<DecodeError> for ReconcileError {
    fn from(value: DecodeError) -> Self {
        Self::Decode(value)
    }
}

/// Write-back failure of `ReconcileService::persist`.
#[derive(Debug)]
pub enum PersistError {
    Encode(serde_json::Error),
    Store(StoreError),
}

impl Display for PersistError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode collection: {err}"),
            Self::Store(err) => write!(f, "failed to save collection: {err}"),
        }
    }
}

impl Error for PersistError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Store(err) => Some(err),
        }
    }
}

/// Use-case service running reconciliation passes over one store key.
pub struct ReconcileService<S: KvStore> {
    store: S,
    store_key: String,
}

impl<S: KvStore> ReconcileService<S> {
    /// Creates a service bound to `store_key`.
    pub fn new(store: S, store_key: impl Into<String>) -> Self {
        Self {
            store,
            store_key: store_key.into(),
        }
    }

    /// Creates a service bound to `DEFAULT_STORE_KEY`.
    pub fn with_default_key(store: S) -> Self {
        Self::new(store, DEFAULT_STORE_KEY)
    }

    pub fn store_key(&self) -> &str {
        &self.store_key
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads and decodes the collection. `Ok(None)` when the key is absent.
    pub fn load(&self) -> Result<Option<Vec<Record>>, ReconcileError> {
        let raw = self
            .store
            .get(&self.store_key)
            .map_err(ReconcileError::StoreRead)?;
        match raw {
            Some(raw) => Ok(Some(decode_collection(&raw)?)),
            None => Ok(None),
        }
    }

    /// Replaces the stored collection. Also used to retry a failed write with
    /// `PendingWrite::collection`.
    pub fn persist(&self, records: &[Record]) -> Result<(), PersistError> {
        let encoded = encode_collection(records).map_err(PersistError::Encode)?;
        self.store
            .set(&self.store_key, &encoded)
            .map_err(PersistError::Store)
    }

    /// Runs one reconciliation pass.
    ///
    /// # Errors
    /// - `StoreRead`/`Decode` when the collection cannot be loaded; nothing
    ///   is mutated or written.
    /// - `StoreWrite`/`Encode` when the reassigned collection cannot be saved.
    pub fn run_pass(
        &self,
        options: &PassOptions,
        reporter: &mut dyn Reporter,
    ) -> Result<PassSummary, ReconcileError> {
        let pass_id = Uuid::new_v4();
        let started_at = Instant::now();
        info!(
            "event=reconcile_pass module=service status=start pass_id={} dry_run={}",
            pass_id, options.dry_run
        );
        reporter.pass_started(pass_id, &self.store_key);

        match self.execute(pass_id, options, reporter) {
            Ok(summary) => {
                info!(
                    "event=reconcile_pass module=service status=ok pass_id={} outcome={} examined={} reassigned={} diagnostics={} duration_ms={}",
                    pass_id,
                    summary.outcome.as_str(),
                    summary.examined,
                    summary.audit.len(),
                    summary.diagnostics.len(),
                    started_at.elapsed().as_millis()
                );
                reporter.finished(summary.outcome, &summary.message());
                Ok(summary)
            }
            Err(err) => {
                error!(
                    "event=reconcile_pass module=service status=error pass_id={} duration_ms={} error_code={} error={}",
                    pass_id,
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                reporter.finished(Outcome::Failed, &err.to_string());
                Err(err)
            }
        }
    }

    fn execute(
        &self,
        pass_id: Uuid,
        options: &PassOptions,
        reporter: &mut dyn Reporter,
    ) -> Result<PassSummary, ReconcileError> {
        let Some(mut records) = self.load()? else {
            return Ok(PassSummary::no_data(pass_id, &self.store_key));
        };

        let scan = scan_duplicates(&records);
        let seed = options.seed.unwrap_or_else(IdSeed::now);
        let audit = reconcile_duplicates(&mut records, &scan, seed);

        let diagnostics = validate_records(&records);
        for diagnostic in &diagnostics {
            reporter.diagnostic(diagnostic);
        }

        let outcome = if audit.is_empty() {
            Outcome::NoDuplicates
        } else if options.dry_run {
            Outcome::DryRun
        } else {
            match self.persist(&records) {
                Ok(()) => Outcome::ReconciledAndSaved,
                Err(PersistError::Encode(err)) => return Err(ReconcileError::Encode(err)),
                Err(PersistError::Store(source)) => {
                    return Err(ReconcileError::StoreWrite {
                        source,
                        pending: Box::new(PendingWrite {
                            collection: records,
                            audit,
                        }),
                    });
                }
            }
        };

        // Fixes are reported only once they are saved, or in a dry run.
        for entry in &audit {
            reporter.audit(entry);
        }

        Ok(PassSummary {
            pass_id,
            store_key: self.store_key.clone(),
            examined: scan.examined,
            audit,
            diagnostics,
            outcome,
        })
    }
}
