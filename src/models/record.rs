//! Record types and identifiers.

use super::{FieldValue, Fields};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Set of tags attached to a record.
pub type TagSet = BTreeSet<String>;

/// Unique identifier for a record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a record ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One dataset entry.
///
/// The identifier is fixed at construction; everything else is mutable.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: RecordId,
    /// Path of the external media file, if any.
    pub media: Option<PathBuf>,
    /// Field data.
    pub fields: Fields,
    /// Tags for categorization.
    pub tags: TagSet,
}

impl Record {
    /// Creates an empty record with the given identifier.
    #[must_use]
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            media: None,
            fields: Fields::new(),
            tags: TagSet::new(),
        }
    }

    /// Creates an empty record with a freshly generated identifier.
    #[must_use]
    pub fn generated() -> Self {
        Self::new(RecordId::generate())
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> &RecordId {
        &self.id
    }

    /// Returns the media path, treating an empty path as unset.
    #[must_use]
    pub fn media_path(&self) -> Option<&Path> {
        self.media
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Sets the media path.
    #[must_use]
    pub fn with_media(mut self, path: impl Into<PathBuf>) -> Self {
        self.media = Some(path.into());
        self
    }

    /// Sets a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Returns a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Returns whether the record carries the tag.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
