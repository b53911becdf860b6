//! # Values and Rows
//!
//! The storage-neutral shape every entity is flattened into.
//!
//! ## Storage Forms
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Value Normalization                                  │
//! │                                                                         │
//! │  Rust side (Value)            Stored form (normalized)                 │
//! │  ──────────────────           ────────────────────────                 │
//! │  Bool(true)           ──►     Integer(1)                               │
//! │  Date(2024-05-01)     ──►     Text("2024-05-01")                       │
//! │  Timestamp(..)        ──►     Text("2024-05-01T10:00:00.000000Z")      │
//! │  Integer / Real / Text / Null  unchanged                               │
//! │                                                                         │
//! │  Both stores write and compare normalized values, so an equality       │
//! │  lookup by `true` finds rows written as `1`.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Name of the identity column shared by every entity table.
pub const ID_COLUMN: &str = "id";

const DATE_FORMAT: &str = "%Y-%m-%d";

// =============================================================================
// Value
// =============================================================================

/// A single scalar stored in a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Returns the form this value takes inside a store.
    pub fn normalized(&self) -> Value {
        match self {
            Value::Bool(b) => Value::Integer(i64::from(*b)),
            Value::Date(d) => Value::Text(d.format(DATE_FORMAT).to_string()),
            Value::Timestamp(ts) => {
                Value::Text(ts.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            other => other.clone(),
        }
    }

    /// Equality as a store evaluates `column = value`.
    ///
    /// NULL matches NULL (the facade turns a null lookup into `IS NULL`),
    /// integers and reals compare numerically.
    pub fn matches(&self, other: &Value) -> bool {
        match (self.normalized(), other.normalized()) {
            (Value::Null, Value::Null) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Real(a), Value::Real(b)) => a == b,
            (Value::Integer(a), Value::Real(b)) | (Value::Real(b), Value::Integer(a)) => {
                a as f64 == b
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short lowercase name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Text(_) => "text",
            Value::Bool(_) => "bool",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            Value::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "'{}'", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

// =============================================================================
// Row
// =============================================================================

/// Column name → value map for one stored record.
///
/// Rows coming out of a store always carry the `id` column; rows built by
/// [`Entity::to_row`](crate::entity::Entity::to_row) never do.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    columns: BTreeMap<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    /// Builder form of [`Row::set`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.columns.remove(column)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterates columns in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The stored identity, if the row came from a store.
    pub fn id(&self) -> Option<i64> {
        self.get(ID_COLUMN).and_then(Value::as_i64)
    }

    /// Same row with every value in its stored form.
    pub fn normalized(&self) -> Row {
        Row {
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), v.normalized()))
                .collect(),
        }
    }

    // -------------------------------------------------------------------------
    // Typed accessors used by `Entity::from_row`
    // -------------------------------------------------------------------------

    fn required(&self, column: &str) -> Result<&Value, DecodeError> {
        match self.get(column) {
            None => Err(DecodeError::missing(column)),
            Some(Value::Null) => Err(DecodeError::UnexpectedNull {
                column: column.to_string(),
            }),
            Some(v) => Ok(v),
        }
    }

    fn optional(&self, column: &str) -> Result<Option<&Value>, DecodeError> {
        match self.get(column) {
            None => Err(DecodeError::missing(column)),
            Some(Value::Null) => Ok(None),
            Some(v) => Ok(Some(v)),
        }
    }

    pub fn i64(&self, column: &str) -> Result<i64, DecodeError> {
        let value = self.required(column)?;
        value
            .as_i64()
            .ok_or_else(|| mismatch(column, "integer", value))
    }

    pub fn opt_i64(&self, column: &str) -> Result<Option<i64>, DecodeError> {
        match self.optional(column)? {
            None => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| mismatch(column, "integer", value)),
        }
    }

    pub fn f64(&self, column: &str) -> Result<f64, DecodeError> {
        let value = self.required(column)?;
        value.as_f64().ok_or_else(|| mismatch(column, "real", value))
    }

    pub fn text(&self, column: &str) -> Result<String, DecodeError> {
        let value = self.required(column)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| mismatch(column, "text", value))
    }

    pub fn opt_text(&self, column: &str) -> Result<Option<String>, DecodeError> {
        match self.optional(column)? {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(|s| Some(s.to_string()))
                .ok_or_else(|| mismatch(column, "text", value)),
        }
    }

    pub fn bool(&self, column: &str) -> Result<bool, DecodeError> {
        let value = self.required(column)?;
        value.as_bool().ok_or_else(|| mismatch(column, "bool", value))
    }

    pub fn date(&self, column: &str) -> Result<NaiveDate, DecodeError> {
        match self.required(column)? {
            Value::Date(d) => Ok(*d),
            Value::Text(s) => {
                NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| DecodeError::InvalidFormat {
                    column: column.to_string(),
                    expected: "date",
                    value: s.clone(),
                })
            }
            other => Err(mismatch(column, "date", other)),
        }
    }

    pub fn timestamp(&self, column: &str) -> Result<DateTime<Utc>, DecodeError> {
        match self.required(column)? {
            Value::Timestamp(ts) => Ok(*ts),
            Value::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|ts| ts.with_timezone(&Utc))
                .map_err(|_| DecodeError::InvalidFormat {
                    column: column.to_string(),
                    expected: "timestamp",
                    value: s.clone(),
                }),
            other => Err(mismatch(column, "timestamp", other)),
        }
    }
}

fn mismatch(column: &str, expected: &'static str, found: &Value) -> DecodeError {
    DecodeError::TypeMismatch {
        column: column.to_string(),
        expected,
        found: found.kind(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        assert_eq!(Value::Bool(true).normalized(), Value::Integer(1));
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            Value::Date(date).normalized(),
            Value::Text("2024-05-01".to_string())
        );
        assert_eq!(Value::from("x").normalized(), Value::from("x"));
    }

    #[test]
    fn test_matches_across_kinds() {
        assert!(Value::Bool(false).matches(&Value::Integer(0)));
        assert!(Value::Integer(3).matches(&Value::Real(3.0)));
        assert!(Value::Null.matches(&Value::Null));
        assert!(!Value::Null.matches(&Value::Integer(0)));
        assert!(!Value::from("1").matches(&Value::Integer(1)));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(7_i64)), Value::Integer(7));
    }

    #[test]
    fn test_typed_accessors() {
        let row = Row::new()
            .with(ID_COLUMN, 4_i64)
            .with("name", "Milk")
            .with("active", 1_i64)
            .with("date", "2024-05-01")
            .with("supplier_id", Value::Null);

        assert_eq!(row.id(), Some(4));
        assert_eq!(row.text("name").unwrap(), "Milk");
        assert!(row.bool("active").unwrap());
        assert_eq!(
            row.date("date").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert_eq!(row.opt_i64("supplier_id").unwrap(), None);
    }

    #[test]
    fn test_accessor_errors() {
        let row = Row::new().with("name", "Milk").with("qty", Value::Null);

        assert_eq!(row.i64("missing"), Err(DecodeError::missing("missing")));
        assert!(matches!(
            row.i64("name"),
            Err(DecodeError::TypeMismatch { expected: "integer", found: "text", .. })
        ));
        assert!(matches!(
            row.i64("qty"),
            Err(DecodeError::UnexpectedNull { .. })
        ));
    }

    #[test]
    fn test_timestamp_roundtrip_through_text() {
        let now = Utc::now();
        let stored = Value::Timestamp(now).normalized();
        let row = Row::new().with("created_at", stored);
        let read = row.timestamp("created_at").unwrap();
        assert_eq!(read.timestamp_micros(), now.timestamp_micros());
    }
}
