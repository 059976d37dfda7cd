//! Snapshot export/import subsystem.
//!
//! A snapshot is a flat directory holding one JSON entry per record plus the
//! record's media file, both named after the sanitized record identifier:
//!
//! ```text
//! out/
//!   a.json      {"id": "a", "fields": {...}, "tags": [...], "media": "a.jpg"}
//!   a.jpg
//!   b.json      {"id": "b", "fields": {...}, "tags": [...], "media": null}
//! ```
//!
//! # Architecture
//!
//! - [`adapter`] converts records to [`SnapshotEntry`] values and back
//! - [`media`] finds, copies and resolves media files
//! - [`services`] orchestrate whole export and import runs
//! - [`report`] accumulates per-record outcomes into an [`OperationReport`]
//!
//! # Examples
//!
//! ```rust,ignore
//! use mediasnap::io::{ImportOptions, SnapshotReader, SnapshotWriter};
//!
//! let report = SnapshotWriter::new().write(&records, &out_dir)?;
//! assert_eq!(report.errored, 0);
//!
//! let reader = SnapshotReader::with_options(ImportOptions::default().with_dry_run(true));
//! let report = reader.read(&out_dir, &mut dataset, &tags)?;
//! ```

pub mod adapter;
pub mod entry;
pub mod media;
pub mod report;
pub mod services;

pub use adapter::{from_canonical, to_canonical};
pub use entry::{ENTRY_EXTENSION, SnapshotEntry, parse_entry};
pub use media::{MediaHandle, MediaLocator, MediaLookup, media_filename, sanitize_id};
pub use report::{IssueSeverity, Operation, OperationReport, Progress, ProgressCallback, ReportIssue};
pub use services::export::{ExportOptions, SnapshotWriter};
pub use services::import::{ImportOptions, SnapshotReader};
