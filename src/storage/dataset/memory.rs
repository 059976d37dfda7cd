//! In-memory dataset.

use crate::models::{Record, RecordId};
use crate::storage::schema::FieldSchema;
use crate::storage::traits::DatasetBackend;
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// A dataset held entirely in memory.
///
/// Keeps insertion order, refuses duplicate identifiers and enforces
/// consistent field types.
#[derive(Debug, Clone, Default)]
pub struct MemoryDataset {
    name: String,
    records: Vec<Record>,
    index: HashMap<RecordId, usize>,
    schema: FieldSchema,
    media_dir: Option<PathBuf>,
}

impl MemoryDataset {
    /// Creates an empty dataset.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the directory imported media are copied into.
    #[must_use]
    pub fn with_media_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.media_dir = Some(dir.into());
        self
    }

    /// Borrows the stored records in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }
}

impl FromIterator<Record> for MemoryDataset {
    /// Collects records into an unnamed dataset, skipping refused ones.
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut dataset = Self::new("");
        for record in iter {
            if let Err(e) = dataset.insert(record) {
                tracing::debug!(error = %e, "Skipping record");
            }
        }
        dataset
    }
}

impl DatasetBackend for MemoryDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn insert(&mut self, record: Record) -> Result<RecordId> {
        if self.index.contains_key(record.id()) {
            return Err(Error::Rejected {
                id: record.id().to_string(),
                reason: "a record with this id already exists".to_string(),
            });
        }
        self.schema.check(&record)?;
        self.schema.extend(&record);

        let id = record.id().clone();
        self.index.insert(id.clone(), self.records.len());
        self.records.push(record);
        Ok(id)
    }

    fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        Ok(self.index.get(id).map(|&i| self.records[i].clone()))
    }

    fn records(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }

    fn media_dir(&self) -> Option<PathBuf> {
        self.media_dir.clone()
    }

    fn len(&self) -> Result<usize> {
        Ok(self.records.len())
    }
}
