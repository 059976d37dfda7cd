//! Media directory ingestion.
//!
//! Creates one record per media file found directly inside a directory,
//! the usual way a dataset gets populated before its first export.

use crate::io::{Operation, OperationReport};
use crate::models::{Record, TagSet};
use crate::storage::traits::DatasetBackend;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// File extensions recognized as media, compared case-insensitively.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "mp4", "mov", "avi", "mkv", "webm",
];

/// Returns whether a path has a recognized media extension.
#[must_use]
pub fn is_media_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MEDIA_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Adds a record for every media file in `dir`.
///
/// Records get fresh identifiers, reference the file in place, and carry
/// `tags`. Files are visited in sorted path order. Subdirectories and
/// non-media files are ignored.
///
/// # Errors
///
/// Returns an error only if `dir` cannot be listed. Refused inserts are
/// recorded in the report.
pub fn ingest_media_dir<D>(dataset: &mut D, dir: &Path, tags: &TagSet) -> Result<OperationReport>
where
    D: DatasetBackend + ?Sized,
{
    let mut report = OperationReport::new(Operation::Ingest);
    for path in list_media_files(dir)? {
        let item = path.display().to_string();
        let absolute = fs::canonicalize(&path).unwrap_or(path);

        let mut record = Record::generated().with_media(absolute);
        record.tags.extend(tags.iter().cloned());

        match dataset.insert(record) {
            Ok(_) => report.record_success(),
            Err(e) => report.record_error(item, &e),
        }
    }
    report.finish();
    Ok(report)
}

fn list_media_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::Io {
            operation: "open_media_dir".to_string(),
            path: dir.display().to_string(),
            cause: "not an existing directory".to_string(),
        });
    }
    let entries = fs::read_dir(dir).map_err(|e| Error::io("read_media_dir", dir, &e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io("read_dir_entry", dir, &e))?.path();
        if path.is_file() && is_media_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
