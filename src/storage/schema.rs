//! Field type schema.
//!
//! Datasets fix a field's type the first time a non-null value is stored
//! under that name. Later records carrying a different type for the same
//! field are refused. Integers and floats are both numbers and may mix.

use crate::models::{FieldValue, Record};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Type class used for compatibility checks.
fn type_class(value: &FieldValue) -> Option<&'static str> {
    match value {
        FieldValue::Null => None,
        FieldValue::Int(_) | FieldValue::Float(_) => Some("number"),
        other => Some(other.type_name()),
    }
}

/// Learned field types of a dataset.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    types: BTreeMap<String, &'static str>,
}

impl FieldSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a record against the schema without changing it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] naming the first conflicting field.
    pub fn check(&self, record: &Record) -> Result<()> {
        for (name, value) in &record.fields {
            let (Some(expected), Some(actual)) = (self.types.get(name), type_class(value)) else {
                continue;
            };
            if *expected != actual {
                return Err(Error::Rejected {
                    id: record.id().to_string(),
                    reason: format!("field '{name}' is {expected} in this dataset, got {actual}"),
                });
            }
        }
        Ok(())
    }

    /// Records the field types of an accepted record.
    pub fn extend(&mut self, record: &Record) {
        for (name, value) in &record.fields {
            if let Some(class) = type_class(value) {
                self.types.entry(name.clone()).or_insert(class);
            }
        }
    }

    /// Returns the type class of a field, if known.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<&'static str> {
        self.types.get(name).copied()
    }
}
