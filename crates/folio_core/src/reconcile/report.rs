//! Pass reporting: outcome, summary and the injected `Reporter` capability.
//!
//! # Invariants
//! - Every pass ends with exactly one `Reporter::finished` call.
//! - `LogReporter` logs ids, indices and counts only, never record names.

use super::validate::Diagnostic;
use super::AuditEntry;
use log::{error, info, warn};
use serde::Serialize;
use uuid::Uuid;

/// Final outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Store has no value under the key.
    NoData,
    /// Every present id was already unique; nothing written.
    NoDuplicates,
    /// Duplicates were reassigned and the collection was written back.
    ReconciledAndSaved,
    /// Duplicates were reassigned in memory only.
    DryRun,
    /// Load or persist failed.
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoData => "no_data",
            Self::NoDuplicates => "no_duplicates",
            Self::ReconciledAndSaved => "reconciled_and_saved",
            Self::DryRun => "dry_run",
            Self::Failed => "failed",
        }
    }
}

/// Structured result of a successful pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassSummary {
    pub pass_id: Uuid,
    pub store_key: String,
    pub examined: usize,
    pub audit: Vec<AuditEntry>,
    pub diagnostics: Vec<Diagnostic>,
    pub outcome: Outcome,
}

impl PassSummary {
    pub(crate) fn no_data(pass_id: Uuid, store_key: &str) -> Self {
        Self {
            pass_id,
            store_key: store_key.to_string(),
            examined: 0,
            audit: Vec::new(),
            diagnostics: Vec::new(),
            outcome: Outcome::NoData,
        }
    }

    /// Operator-facing one-line result.
    pub fn message(&self) -> String {
        match self.outcome {
            Outcome::NoData => format!("no data found under `{}`", self.store_key),
            Outcome::NoDuplicates => {
                format!("no duplicates found in {} records", self.examined)
            }
            Outcome::ReconciledAndSaved => format!(
                "fixed {} duplicate ids in {} records and saved",
                self.audit.len(),
                self.examined
            ),
            Outcome::DryRun => format!(
                "found {} duplicate ids in {} records; dry run, nothing saved",
                self.audit.len(),
                self.examined
            ),
            Outcome::Failed => "reconciliation failed".to_string(),
        }
    }
}

/// Receives progress of a pass as it happens.
pub trait Reporter {
    fn pass_started(&mut self, pass_id: Uuid, store_key: &str);
    fn audit(&mut self, entry: &AuditEntry);
    fn diagnostic(&mut self, diagnostic: &Diagnostic);
    fn finished(&mut self, outcome: Outcome, message: &str);
}

/// Reporter that writes structured `log` events.
#[derive(Debug, Default)]
pub struct LogReporter {
    pass_id: Option<Uuid>,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn pass_label(&self) -> String {
        self.pass_id
            .map_or_else(|| "none".to_string(), |id| id.to_string())
    }
}

impl Reporter for LogReporter {
    fn pass_started(&mut self, pass_id: Uuid, _store_key: &str) {
        self.pass_id = Some(pass_id);
    }

    fn audit(&mut self, entry: &AuditEntry) {
        info!(
            "event=id_reassigned module=reconcile pass_id={} index={} first_index={} original_id={} assigned_id={}",
            self.pass_label(),
            entry.index,
            entry.first_index,
            entry.original_id,
            entry.assigned_id
        );
    }

    fn diagnostic(&mut self, diagnostic: &Diagnostic) {
        warn!(
            "event=record_invalid module=reconcile pass_id={} index={} code={}",
            self.pass_label(),
            diagnostic.index(),
            diagnostic.code()
        );
    }

    fn finished(&mut self, outcome: Outcome, message: &str) {
        if outcome == Outcome::Failed {
            error!(
                "event=reconcile_outcome module=reconcile pass_id={} status=error outcome={} error={}",
                self.pass_label(),
                outcome.as_str(),
                message
            );
        } else {
            info!(
                "event=reconcile_outcome module=reconcile pass_id={} status=ok outcome={}",
                self.pass_label(),
                outcome.as_str()
            );
        }
    }
}

/// One event seen by `CollectingReporter`.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    Started { pass_id: Uuid, store_key: String },
    Audit(AuditEntry),
    Diagnostic(Diagnostic),
    Finished { outcome: Outcome, message: String },
}

/// Reporter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    pub events: Vec<ReportEvent>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome of the last finished pass.
    pub fn outcome(&self) -> Option<Outcome> {
        self.events.iter().rev().find_map(|event| match event {
            ReportEvent::Finished { outcome, .. } => Some(*outcome),
            _ => None,
        })
    }

    pub fn audits(&self) -> Vec<&AuditEntry> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Audit(entry) => Some(entry),
                _ => None,
            })
            .collect()
    }

    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Diagnostic(diagnostic) => Some(diagnostic),
                _ => None,
            })
            .collect()
    }
}

impl Reporter for CollectingReporter {
    fn pass_started(&mut self, pass_id: Uuid, store_key: &str) {
        self.events.push(ReportEvent::Started {
            pass_id,
            store_key: store_key.to_string(),
        });
    }

    fn audit(&mut self, entry: &AuditEntry) {
        self.events.push(ReportEvent::Audit(entry.clone()));
    }

    fn diagnostic(&mut self, diagnostic: &Diagnostic) {
        self.events.push(ReportEvent::Diagnostic(diagnostic.clone()));
    }

    fn finished(&mut self, outcome: Outcome, message: &str) {
        self.events.push(ReportEvent::Finished {
            outcome,
            message: message.to_string(),
        });
    }
}
