//! Filesystem-backed dataset.
//!
//! Stores each record as an individual JSON file:
//!
//! ```text
//! <root>/
//!   records/<sanitized-id>.json
//!   media/
//! ```
//!
//! # Security
//!
//! - **Path traversal**: record file names go through [`sanitize_id`], so an
//!   identifier can never escape `records/`
//! - **File size limits**: record files above [`MAX_FILE_SIZE`] are refused

use crate::io::sanitize_id;
use crate::models::{Fields, Record, RecordId, TagSet};
use crate::storage::schema::FieldSchema;
use crate::storage::traits::DatasetBackend;
use crate::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum size of a stored record file (1MB).
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

const RECORDS_DIR: &str = "records";
const MEDIA_DIR: &str = "media";

/// Serializable record format for filesystem storage.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    /// Insertion sequence number, used to restore insertion order.
    seq: u64,
    media: Option<PathBuf>,
    fields: Fields,
    tags: TagSet,
    /// Unix epoch seconds.
    #[serde(default)]
    created_at: i64,
}

impl StoredRecord {
    fn from_record(record: &Record, seq: u64) -> Self {
        Self {
            id: record.id().as_str().to_string(),
            seq,
            media: record.media.clone(),
            fields: record.fields.clone(),
            tags: record.tags.clone(),
            created_at: Utc::now().timestamp(),
        }
    }

    fn into_record(self) -> Record {
        let mut record = Record::new(self.id);
        record.media = self.media;
        record.fields = self.fields;
        record.tags = self.tags;
        record
    }
}

/// A dataset persisted as one JSON file per record.
#[derive(Debug)]
pub struct FilesystemDataset {
    name: String,
    root: PathBuf,
    schema: FieldSchema,
    ids: HashSet<String>,
    next_seq: u64,
}

impl FilesystemDataset {
    /// Opens the dataset rooted at `root`, creating its directories if needed.
    ///
    /// Existing records are scanned to restore the field schema and the next
    /// insertion sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created or an existing
    /// record file cannot be read.
    pub fn open(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for sub in [RECORDS_DIR, MEDIA_DIR] {
            let dir = root.join(sub);
            fs::create_dir_all(&dir).map_err(|e| Error::io("create_dataset_dir", &dir, &e))?;
        }

        let mut dataset = Self {
            name: name.into(),
            root,
            schema: FieldSchema::new(),
            ids: HashSet::new(),
            next_seq: 0,
        };
        for stored in dataset.load_all()? {
            dataset.next_seq = dataset.next_seq.max(stored.seq + 1);
            dataset.ids.insert(stored.id.clone());
            dataset.schema.extend(&stored.into_record());
        }
        tracing::debug!(
            dataset = %dataset.name,
            records = dataset.ids.len(),
            "Opened filesystem dataset"
        );
        Ok(dataset)
    }

    /// Returns the dataset root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn records_dir(&self) -> PathBuf {
        self.root.join(RECORDS_DIR)
    }

    fn record_path(&self, id: &RecordId) -> PathBuf {
        self.records_dir()
            .join(format!("{}.json", sanitize_id(id.as_str())))
    }

    fn load_all(&self) -> Result<Vec<StoredRecord>> {
        let dir = self.records_dir();
        let entries = fs::read_dir(&dir).map_err(|e| Error::io("read_records_dir", &dir, &e))?;

        let mut stored = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io("read_dir_entry", &dir, &e))?;
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") || !path.is_file() {
                continue;
            }
            stored.push(read_stored(&path)?);
        }
        stored.sort_by_key(|s| s.seq);
        Ok(stored)
    }
}

/// Reads one record file, enforcing the size limit.
fn read_stored(path: &Path) -> Result<StoredRecord> {
    let metadata = fs::metadata(path).map_err(|e| Error::io("read_file_metadata", path, &e))?;
    if metadata.len() > MAX_FILE_SIZE {
        return Err(Error::InvalidInput(format!(
            "record file exceeds maximum size of {MAX_FILE_SIZE} bytes: {}",
            path.display()
        )));
    }
    let bytes = fs::read(path).map_err(|e| Error::io("read_record_file", path, &e))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Parse(format!("{}: {e}", path.display())))
}

impl DatasetBackend for FilesystemDataset {
    fn name(&self) -> &str {
        &self.name
    }

    fn insert(&mut self, record: Record) -> Result<RecordId> {
        let id = record.id().clone();
        if self.ids.contains(id.as_str()) {
            return Err(Error::Rejected {
                id: id.to_string(),
                reason: "a record with this id already exists".to_string(),
            });
        }
        let path = self.record_path(&id);
        if path.exists() {
            return Err(Error::Rejected {
                id: id.to_string(),
                reason: format!("storage file '{}' is taken by another record", path.display()),
            });
        }
        self.schema.check(&record)?;

        let stored = StoredRecord::from_record(&record, self.next_seq);
        let json = serde_json::to_vec_pretty(&stored)
            .map_err(|e| Error::Parse(format!("serialize record '{id}': {e}")))?;

        if u64::try_from(json.len()).unwrap_or(u64::MAX) > MAX_FILE_SIZE {
            return Err(Error::Rejected {
                id: id.to_string(),
                reason: format!("serialized record exceeds maximum size of {MAX_FILE_SIZE} bytes"),
            });
        }

        let partial = path.with_extension("json.partial");
        fs::write(&partial, json).map_err(|e| {
            let _ = fs::remove_file(&partial);
            Error::io("write_record_file", &partial, &e)
        })?;
        fs::rename(&partial, &path).map_err(|e| {
            let _ = fs::remove_file(&partial);
            Error::io("rename_record_file", &path, &e)
        })?;

        self.schema.extend(&record);
        self.ids.insert(id.as_str().to_string());
        self.next_seq += 1;
        Ok(id)
    }

    fn get(&self, id: &RecordId) -> Result<Option<Record>> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let stored = read_stored(&path)?;
        // Sanitized names can be shared; only return an exact id match.
        if stored.id != id.as_str() {
            return Ok(None);
        }
        Ok(Some(stored.into_record()))
    }

    fn records(&self) -> Result<Vec<Record>> {
        Ok(self
            .load_all()?
            .into_iter()
            .map(StoredRecord::into_record)
            .collect())
    }

    fn media_dir(&self) -> Option<PathBuf> {
        Some(self.root.join(MEDIA_DIR))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.ids.len())
    }
}
