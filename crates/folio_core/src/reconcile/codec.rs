//! Collection wire codec.
//!
//! The stored value is a JSON array of JSON objects. Decoding checks the
//! shape element by element so a malformed store entry is reported with the
//! offending position instead of a generic type error.

use crate::model::record::Record;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stored value could not be decoded into a collection.
#[derive(Debug)]
pub enum DecodeError {
    /// Value is not valid JSON.
    Json(serde_json::Error),
    /// Top-level value is valid JSON but not an array.
    NotAnArray { found: &'static str },
    /// One element of the array is not an object.
    NotAnObject { index: usize, found: &'static str },
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "stored collection is not valid JSON: {err}"),
            Self::NotAnArray { found } => {
                write!(f, "stored collection must be a JSON array, found {found}")
            }
            Self::NotAnObject { index, found } => write!(
                f,
                "stored collection element #{index} must be a JSON object, found {found}"
            ),
        }
    }
}

impl Error for DecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::NotAnArray { .. } | Self::NotAnObject { .. } => None,
        }
    }
}

impl From<serde_json::Error> for DecodeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Decodes a stored value into an ordered collection.
pub fn decode_collection(raw: &str) -> Result<Vec<Record>, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(DecodeError::NotAnArray {
                found: json_type_name(&other),
            })
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(fields) => Ok(Record::from_fields(fields)),
            other => Err(DecodeError::NotAnObject {
                index,
                found: json_type_name(&other),
            }),
        })
        .collect()
}

/// Encodes a collection for storage.
pub fn encode_collection(records: &[Record]) -> Result<String, serde_json::Error> {
    serde_json::to_string(records)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
