//! Portfolio record model.
//!
//! # Responsibility
//! - Wrap one JSON object of the stored collection as a `Record`.
//! - Derive a comparable `RecordKey` from the raw `id` value.
//!
//! # Invariants
//! - An `id` is present only when it is a non-empty string or a non-zero
//!   number. `null`, booleans, `""`, `0` and non-scalar values count as missing.
//! - Keys compare by JSON type and value: `"1"` and `1` are different keys.
//! - Numeric keys compare by numeric value: `1`, `1.0` and `1e0` are one key.
//! - `set_id` keeps the field position of an existing `id` key.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt::{Display, Formatter};

/// Field holding the record identifier.
pub const ID_FIELD: &str = "id";
/// Field holding the human-readable record label.
pub const NAME_FIELD: &str = "name";

/// Comparable form of a present record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordKey {
    Text(String),
    Number(Number),
}

impl RecordKey {
    /// Builds a key from a raw JSON value, or `None` when the value does not
    /// count as a present identifier.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) if !text.is_empty() => Some(Self::Text(text.clone())),
            Value::Number(number) if !is_zero(number) => Some(Self::Number(canonical(number))),
            _ => None,
        }
    }

    /// Returns the JSON value written back into a record.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Number(number) => Value::Number(number.clone()),
        }
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Number(number) => write!(f, "{number}"),
        }
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

fn is_zero(number: &Number) -> bool {
    number.as_f64() == Some(0.0)
}

// Integral floats fold into the integer form so `100` and `1e2` hash alike.
fn canonical(number: &Number) -> Number {
    if number.is_i64() || number.is_u64() {
        return number.clone();
    }
    let Some(float) = number.as_f64().filter(|float| float.fract() == 0.0) else {
        return number.clone();
    };
    if float >= i64::MIN as f64 && float < i64::MAX as f64 {
        Number::from(float as i64)
    } else if float > 0.0 && float < u64::MAX as f64 {
        Number::from(float as u64)
    } else {
        number.clone()
    }
}

/// One portfolio entity (for example a company) as stored in the collection.
///
/// Serialized transparently as the underlying JSON object so unknown fields
/// survive a decode/encode cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing JSON object.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Convenience constructor for a record with a text id and a name.
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut record = Self::new();
        record
            .fields
            .insert(ID_FIELD.to_string(), Value::String(id.into()));
        record
            .fields
            .insert(NAME_FIELD.to_string(), Value::String(name.into()));
        record
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Returns one raw field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns the raw `id` value, present or not.
    pub fn raw_id(&self) -> Option<&Value> {
        self.fields.get(ID_FIELD)
    }

    /// Returns the comparable identifier when the record has one.
    pub fn id(&self) -> Option<RecordKey> {
        self.raw_id().and_then(RecordKey::from_value)
    }

    /// Returns the record name when it is a non-empty string.
    pub fn name(&self) -> Option<&str> {
        match self.fields.get(NAME_FIELD) {
            Some(Value::String(name)) if !name.is_empty() => Some(name.as_str()),
            _ => None,
        }
    }

    /// Replaces the identifier, leaving every other field untouched.
    pub fn set_id(&mut self, key: &RecordKey) {
        self.fields.insert(ID_FIELD.to_string(), key.to_value());
    }
}

impl From<Map<String, Value>> for Record {
    fn from(value: Map<String, Value>) -> Self {
        Self::from_fields(value)
    }
}
