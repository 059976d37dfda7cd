//! # mediasnap
//!
//! Portable snapshots of media-centric datasets.
//!
//! A snapshot is a flat directory holding one JSON entry per record plus a
//! copy of each record's media file. Snapshots can be re-imported into any
//! dataset, with caller-supplied tags applied on the way in.
//!
//! ## Features
//!
//! - Lossless round trip of scalar, nested and list fields
//! - Tolerant of missing media (metadata-only export/import with warnings)
//! - Per-record error isolation; every run returns an [`io::OperationReport`]
//! - Fatal detection of file name collisions before anything is written
//!
//! ## Example
//!
//! ```rust,ignore
//! use mediasnap::io::{SnapshotReader, SnapshotWriter};
//! use mediasnap::storage::MemoryDataset;
//!
//! let report = SnapshotWriter::new().write(&records, "snapshots/2025-01")?;
//! println!("exported {} records", report.succeeded);
//!
//! let mut dest = MemoryDataset::new("restored");
//! let report = SnapshotReader::new().read("snapshots/2025-01", &mut dest, &tags)?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use std::path::Path;
use thiserror::Error as ThisError;

pub mod config;
pub mod io;
pub mod models;
pub mod observability;
pub mod storage;

pub use config::MediasnapConfig;
pub use io::{
    ExportOptions, ImportOptions, MediaHandle, MediaLocator, MediaLookup, OperationReport,
    SnapshotEntry, SnapshotReader, SnapshotWriter,
};
pub use models::{FieldValue, Fields, Record, RecordId, RecordSelection, TagSet};
pub use storage::{DatasetBackend, DatasetCatalog, FilesystemDataset, MemoryDataset};

/// Error type for mediasnap operations.
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Io` | Directory creation, file copy, read or write fails |
/// | `Parse` | A snapshot entry is not valid JSON |
/// | `SchemaMismatch` | An entry or field value has the wrong structure |
/// | `Collision` | Two records would be written to the same file name |
/// | `InvalidInput` | A caller parameter or config value is unusable |
/// | `Rejected` | The destination dataset refuses an insert |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A filesystem operation failed.
    ///
    /// Fatal for the whole run when raised during setup (output directory
    /// creation, input directory listing); scoped to one record otherwise.
    #[error("operation '{operation}' failed on {path}: {cause}")]
    Io {
        /// The operation that failed.
        operation: String,
        /// The path involved.
        path: String,
        /// The underlying cause.
        cause: String,
    },

    /// A snapshot entry is not well-formed JSON.
    #[error("parse error: {0}")]
    Parse(String),

    /// A snapshot entry or field value is structurally invalid.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Two distinct records map to the same output file name.
    #[error("records '{first}' and '{second}' both map to '{filename}'")]
    Collision {
        /// Identifier of the first record claiming the name.
        first: String,
        /// Identifier of the second record claiming the name.
        second: String,
        /// The contested file name.
        filename: String,
    },

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The destination dataset refused a record.
    #[error("record '{id}' rejected: {reason}")]
    Rejected {
        /// Identifier of the refused record.
        id: String,
        /// Why the destination refused it.
        reason: String,
    },
}

impl Error {
    /// Builds an [`Error::Io`] from an I/O error and the path it concerns.
    pub fn io(operation: &str, path: &Path, err: &std::io::Error) -> Self {
        Self::Io {
            operation: operation.to_string(),
            path: path.display().to_string(),
            cause: err.to_string(),
        }
    }

    /// Returns a short, stable label for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "io",
            Self::Parse(_) => "parse",
            Self::SchemaMismatch(_) => "schema_mismatch",
            Self::Collision { .. } => "collision",
            Self::InvalidInput(_) => "invalid_input",
            Self::Rejected { .. } => "rejected",
        }
    }
}

/// Result type alias for mediasnap operations.
pub type Result<T> = std::result::Result<T, Error>;
