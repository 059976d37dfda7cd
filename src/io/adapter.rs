//! Record model adapter.
//!
//! Converts records into their canonical snapshot form and back. Both
//! directions are pure: no filesystem access, no shared state.

use super::entry::SnapshotEntry;
use super::media::{media_filename, sanitize_id};
use crate::Result;
use crate::models::Record;
use std::path::PathBuf;

/// Converts a record into its snapshot entry.
///
/// Fields and tags are deep-copied, so the entry can be modified (for
/// example when media turns out to be missing) without touching the record.
/// `media` holds the name the media file will have inside the snapshot, or
/// `None` when the record has no media reference.
#[must_use]
pub fn to_canonical(record: &Record) -> SnapshotEntry {
    let stem = sanitize_id(record.id().as_str());
    SnapshotEntry {
        id: record.id().as_str().to_string(),
        fields: record.fields.clone(),
        tags: record.tags.clone(),
        media: record.media_path().map(|path| media_filename(&stem, path)),
    }
}

/// Rebuilds a record from a snapshot entry.
///
/// The record gets a freshly generated identifier; the serialized identifier
/// is never reused so imports cannot collide with records already present in
/// the destination.
///
/// # Errors
///
/// Returns [`crate::Error::SchemaMismatch`] if a field value cannot be
/// represented.
pub fn from_canonical(entry: SnapshotEntry, media: Option<PathBuf>) -> Result<Record> {
    entry.validate()?;

    let mut record = Record::generated();
    record.fields = entry.fields;
    record.tags = entry.tags;
    record.media = media;
    Ok(record)
}
