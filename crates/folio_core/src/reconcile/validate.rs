//! Structural validation of a collection.
//!
//! Findings are advisory. The collection is never mutated here.

use crate::model::record::{Record, RecordKey};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// One advisory finding about a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Record has no usable id. Named by its `name` when it has one.
    MissingIdentifier { index: usize, name: Option<String> },
    /// Record has no usable name. Named by its `id` when it has one.
    MissingName { index: usize, id: Option<RecordKey> },
}

impl Diagnostic {
    pub fn index(&self) -> usize {
        match self {
            Self::MissingIdentifier { index, .. } | Self::MissingName { index, .. } => *index,
        }
    }

    /// Stable code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingIdentifier { .. } => "missing_identifier",
            Self::MissingName { .. } => "missing_name",
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentifier {
                index,
                name: Some(name),
            } => write!(f, "record #{index} `{name}` has no id"),
            Self::MissingIdentifier { index, name: None } => {
                write!(f, "record #{index} (unnamed) has no id")
            }
            Self::MissingName {
                index,
                id: Some(id),
            } => write!(f, "record #{index} with id `{id}` has no name"),
            Self::MissingName { index, id: None } => {
                write!(f, "record #{index} (no id) has no name")
            }
        }
    }
}

/// Reports every record missing an id or a name, in collection order.
pub fn validate_records(records: &[Record]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (index, record) in records.iter().enumerate() {
        let id = record.id();
        let name = record.name();

        if id.is_none() {
            diagnostics.push(Diagnostic::MissingIdentifier {
                index,
                name: name.map(str::to_string),
            });
        }
        if name.is_none() {
            diagnostics.push(Diagnostic::MissingName { index, id });
        }
    }
    diagnostics
}
