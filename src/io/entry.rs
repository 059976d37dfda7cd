//! Snapshot entry file format.
//!
//! Each entry is a UTF-8 JSON object with four required keys:
//!
//! | Key | Type | Meaning |
//! |-----|------|---------|
//! | `id` | string | Identifier of the record in the source dataset |
//! | `fields` | object | Field name to value |
//! | `tags` | array of strings | Tags saved with the record |
//! | `media` | string or null | Sibling media file name |
//!
//! Unknown keys are ignored when reading.

use crate::models::{Fields, TagSet};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// File extension of entry files.
pub const ENTRY_EXTENSION: &str = "json";

const REQUIRED_KEYS: [&str; 4] = ["id", "fields", "tags", "media"];

/// Serialized form of one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Identifier of the record in the source dataset.
    pub id: String,
    /// Field data.
    pub fields: Fields,
    /// Tags saved with the record.
    pub tags: TagSet,
    /// Media file name relative to the snapshot directory.
    pub media: Option<String>,
}

impl SnapshotEntry {
    /// Checks that every field value survives JSON serialization unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in &self.fields {
            if let Some((path, reason)) = value.find_invalid(&format!("fields.{name}")) {
                return Err(Error::SchemaMismatch(format!(
                    "entry '{}': {reason} at {path}",
                    self.id
                )));
            }
        }
        Ok(())
    }

    /// Serializes the entry as pretty-printed JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] if a field cannot be represented.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        self.validate()?;
        let mut bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| Error::SchemaMismatch(format!("entry '{}': {e}", self.id)))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// Parses an entry file's content.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed JSON and [`Error::SchemaMismatch`]
/// when the document is not an object with the required keys and types.
pub fn parse_entry(bytes: &[u8]) -> Result<SnapshotEntry> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| Error::Parse(e.to_string()))?;

    let Some(object) = value.as_object() else {
        return Err(Error::SchemaMismatch(
            "entry is not a JSON object".to_string(),
        ));
    };
    if let Some(missing) = REQUIRED_KEYS.iter().find(|k| !object.contains_key(**k)) {
        return Err(Error::SchemaMismatch(format!(
            "entry is missing required key '{missing}'"
        )));
    }

    let entry: SnapshotEntry =
        serde_json::from_value(value).map_err(|e| Error::SchemaMismatch(e.to_string()))?;
    entry.validate()?;
    Ok(entry)
}
