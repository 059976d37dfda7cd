//! Dataset backend trait.

use crate::Result;
use crate::models::{Record, RecordId};
use std::path::PathBuf;

/// A dataset records can be read from and inserted into.
///
/// The snapshot engine only needs this minimal contract: the writer consumes
/// records obtained from a backend, the reader inserts into one.
pub trait DatasetBackend {
    /// Returns the dataset name.
    fn name(&self) -> &str;

    /// Inserts a record and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Rejected`] if the dataset refuses the record
    /// (duplicate identifier, conflicting field types), or an I/O error.
    fn insert(&mut self, record: Record) -> Result<RecordId>;

    /// Retrieves a record by ID.
    fn get(&self, id: &RecordId) -> Result<Option<Record>>;

    /// Returns all records in insertion order.
    fn records(&self) -> Result<Vec<Record>>;

    /// Returns the directory imported media should be copied into, if the
    /// dataset manages its own media store.
    fn media_dir(&self) -> Option<PathBuf> {
        None
    }

    /// Returns the number of records.
    fn len(&self) -> Result<usize> {
        Ok(self.records()?.len())
    }

    /// Returns whether the dataset holds no records.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
