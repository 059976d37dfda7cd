//! Named datasets under a data directory.

use super::{FilesystemDataset, is_safe_filename};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Catalog of [`FilesystemDataset`]s, one directory per dataset name.
#[derive(Debug, Clone)]
pub struct DatasetCatalog {
    data_dir: PathBuf,
}

impl DatasetCatalog {
    /// Creates a catalog rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns the catalog root.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the directory a dataset lives in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the name is not a safe path component.
    pub fn dataset_dir(&self, name: &str) -> Result<PathBuf> {
        if !is_safe_filename(name) {
            return Err(Error::InvalidInput(format!(
                "dataset name must be non-empty and use only letters, digits, '-' or '_': {name:?}"
            )));
        }
        Ok(self.data_dir.join(name))
    }

    /// Opens an existing dataset.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the name is invalid or no such
    /// dataset exists.
    pub fn open(&self, name: &str) -> Result<FilesystemDataset> {
        let dir = self.dataset_dir(name)?;
        if !dir.is_dir() {
            return Err(Error::InvalidInput(format!(
                "dataset '{name}' does not exist in {}",
                self.data_dir.display()
            )));
        }
        FilesystemDataset::open(name, dir)
    }

    /// Opens a dataset, creating it if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or the dataset cannot be
    /// created.
    pub fn open_or_create(&self, name: &str) -> Result<FilesystemDataset> {
        let dir = self.dataset_dir(name)?;
        if !dir.exists() {
            tracing::info!(dataset = name, "Creating dataset");
        }
        FilesystemDataset::open(name, dir)
    }

    /// Lists dataset names in sorted order.
    ///
    /// A missing data directory yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be read.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.data_dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.data_dir)
            .map_err(|e| Error::io("read_data_dir", &self.data_dir, &e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io("read_dir_entry", &self.data_dir, &e))?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if path.is_dir() && is_safe_filename(name) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
