//! Field values.
//!
//! Host datasets expose schema-less fields. They are modelled here as an
//! insertion-ordered map from field name to a tagged-union value so that every
//! shape a record can carry is known statically.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mapping of field name to value, kept in insertion order.
pub type Fields = IndexMap<String, FieldValue>;

/// A single field value.
///
/// Serialized untagged, so a value maps one-to-one onto the JSON value it
/// represents: `Int(3)` is `3`, `Map` is a JSON object, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number. Must be finite to be serializable.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered sequence.
    List(Vec<FieldValue>),
    /// Nested mapping, kept in insertion order.
    Map(IndexMap<String, FieldValue>),
}

impl FieldValue {
    /// Returns the name of the value's shape.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Returns the string content if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Checks that the value can be represented in JSON without loss.
    ///
    /// Returns the dotted path of the first offending value and the reason.
    /// Only non-finite floats have no JSON form.
    pub fn find_invalid(&self, path: &str) -> Option<(String, &'static str)> {
        match self {
            Self::Float(f) if !f.is_finite() => Some((path.to_string(), "non-finite float")),
            Self::List(items) => items
                .iter()
                .enumerate()
                .find_map(|(i, item)| item.find_invalid(&format!("{path}[{i}]"))),
            Self::Map(map) => map
                .iter()
                .find_map(|(key, value)| value.find_invalid(&format!("{path}.{key}"))),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::List(items) => write!(f, "[{} items]", items.len()),
            Self::Map(map) => write!(f, "{{{} keys}}", map.len()),
        }
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Self>> for FieldValue {
    fn from(items: Vec<Self>) -> Self {
        Self::List(items)
    }
}

impl From<IndexMap<String, Self>> for FieldValue {
    fn from(map: IndexMap<String, Self>) -> Self {
        Self::Map(map)
    }
}
