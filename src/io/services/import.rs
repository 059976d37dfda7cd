//! Snapshot reader.
//!
//! Imports every entry file of a snapshot directory into a destination
//! dataset. Each entry is handled independently: a malformed entry or a
//! refused insert is reported and the run moves on to the next file.

use crate::io::adapter::from_canonical;
use crate::io::entry::{ENTRY_EXTENSION, parse_entry};
use crate::io::media::{MediaHandle, MediaLocator, MediaLookup, sanitize_id};
use crate::io::report::{Operation, OperationReport, Progress, ProgressCallback};
use crate::models::{RecordId, TagSet};
use crate::storage::DatasetBackend;
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// Options for snapshot import.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Directory imported media are copied into. Falls back to the
    /// destination's own media store.
    pub media_dir: Option<PathBuf>,
    /// Copy media out of the snapshot. When off, or when no media directory
    /// is known, records reference the files inside the snapshot.
    pub copy_media: bool,
    /// Parse and validate entries without copying or inserting anything.
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            media_dir: None,
            copy_media: true,
            dry_run: false,
        }
    }
}

impl ImportOptions {
    /// Sets the media directory.
    #[must_use]
    pub fn with_media_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.media_dir = Some(dir.into());
        self
    }

    /// Enables or disables media copying.
    #[must_use]
    pub const fn with_copy_media(mut self, copy: bool) -> Self {
        self.copy_media = copy;
        self
    }

    /// Enables or disables dry run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Reads snapshot directories into datasets.
#[derive(Debug, Clone, Default)]
pub struct SnapshotReader {
    locator: MediaLocator,
    options: ImportOptions,
}

impl SnapshotReader {
    /// Creates a reader with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reader with the given options.
    #[must_use]
    pub const fn with_options(options: ImportOptions) -> Self {
        Self {
            locator: MediaLocator::new(),
            options,
        }
    }

    /// Imports all entries of `in_dir` into `destination`.
    ///
    /// `tags` are added to every imported record, on top of the tags saved
    /// in the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the input directory cannot be listed or the
    /// media directory cannot be created. Per-entry failures are reported,
    /// not returned.
    pub fn read<D>(
        &self,
        in_dir: impl AsRef<Path>,
        destination: &mut D,
        tags: &TagSet,
    ) -> Result<OperationReport>
    where
        D: DatasetBackend + ?Sized,
    {
        self.read_with_progress(in_dir, destination, tags, None)
    }

    /// Imports all entries of `in_dir`, reporting progress after each entry.
    ///
    /// # Errors
    ///
    /// See [`Self::read`].
    #[instrument(
        skip_all,
        fields(in_dir = %in_dir.as_ref().display(), dataset = destination.name())
    )]
    pub fn read_with_progress<D>(
        &self,
        in_dir: impl AsRef<Path>,
        destination: &mut D,
        tags: &TagSet,
        progress: Option<ProgressCallback>,
    ) -> Result<OperationReport>
    where
        D: DatasetBackend + ?Sized,
    {
        let in_dir = in_dir.as_ref();
        let entry_files = list_entry_files(in_dir)?;
        let media_dir = self.prepare_media_dir(destination)?;

        tracing::info!(
            entries = entry_files.len(),
            dry_run = self.options.dry_run,
            "Importing snapshot"
        );

        let total = entry_files.len();
        let mut report = OperationReport::new(Operation::Import);
        for path in &entry_files {
            let label = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

            match self.import_entry(path, in_dir, media_dir.as_deref(), destination, tags, &mut report) {
                Ok(Some(id)) => {
                    tracing::debug!(entry = %label, id = %id, "Imported entry");
                    report.record_success();
                },
                Ok(None) => report.record_skip(),
                Err(e) => report.record_error(label, &e),
            }
            if let Some(ref cb) = progress {
                cb(&Progress::of(&report, total));
            }
        }

        report.finish();
        Ok(report)
    }

    /// Imports one entry file.
    ///
    /// Returns the new record's identifier, or `None` in dry run mode.
    fn import_entry<D>(
        &self,
        path: &Path,
        in_dir: &Path,
        media_dir: Option<&Path>,
        destination: &mut D,
        tags: &TagSet,
        report: &mut OperationReport,
    ) -> Result<Option<RecordId>>
    where
        D: DatasetBackend + ?Sized,
    {
        let bytes = fs::read(path).map_err(|e| Error::io("read_entry", path, &e))?;
        let entry = parse_entry(&bytes)?;
        let source_id = entry.id.clone();

        let media = match entry.media.as_deref() {
            None => None,
            Some(name) => match self.locator.resolve_from_snapshot(in_dir, Some(name)) {
                MediaLookup::Found(handle) => Some(handle),
                MediaLookup::NotFound(reason) => {
                    report.add_warning(&source_id, format!("importing without media: {reason}"));
                    None
                },
            },
        };

        let mut record = from_canonical(entry, media.as_ref().map(|h| h.path.clone()))?;
        record.tags.extend(tags.iter().cloned());

        if self.options.dry_run {
            return Ok(None);
        }

        let copied = match (media.as_ref(), media_dir) {
            (Some(handle), Some(dir)) => {
                let placed = self.place_media(handle, dir, record.id())?;
                record.media = Some(placed.clone());
                Some(placed)
            },
            _ => None,
        };

        match destination.insert(record) {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                if let Some(orphan) = copied {
                    let _ = fs::remove_file(orphan);
                }
                Err(e)
            },
        }
    }

    /// Copies snapshot media into the media store under the new record id.
    fn place_media(&self, handle: &MediaHandle, dir: &Path, id: &RecordId) -> Result<PathBuf> {
        let name = self.locator.copy_into(handle, dir, &sanitize_id(id.as_str()))?;
        metrics::counter!("snapshot_media_bytes_total", "operation" => "import")
            .increment(handle.size);
        Ok(dir.join(name))
    }

    /// Resolves and creates the directory imported media go to.
    fn prepare_media_dir<D>(&self, destination: &D) -> Result<Option<PathBuf>>
    where
        D: DatasetBackend + ?Sized,
    {
        if !self.options.copy_media || self.options.dry_run {
            return Ok(None);
        }
        let Some(dir) = self
            .options
            .media_dir
            .clone()
            .or_else(|| destination.media_dir())
        else {
            tracing::debug!("No media store configured, referencing snapshot media in place");
            return Ok(None);
        };
        fs::create_dir_all(&dir).map_err(|e| Error::io("create_media_dir", &dir, &e))?;
        Ok(Some(dir))
    }
}

/// Lists the entry files of a snapshot directory in listing order.
///
/// Anything that is not a regular `*.json` file is ignored.
fn list_entry_files(in_dir: &Path) -> Result<Vec<PathBuf>> {
    if !in_dir.is_dir() {
        return Err(Error::Io {
            operation: "open_snapshot_dir".to_string(),
            path: in_dir.display().to_string(),
            cause: "not an existing directory".to_string(),
        });
    }

    let entries = fs::read_dir(in_dir).map_err(|e| Error::io("read_snapshot_dir", in_dir, &e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io("read_dir_entry", in_dir, &e))?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION) && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FieldValue, Record};
    use crate::storage::MemoryDataset;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn tags(items: &[&str]) -> TagSet {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_import_options_defaults() {
        let options = ImportOptions::default();
        assert!(options.copy_media);
        assert!(!options.dry_run);
        assert!(options.media_dir.is_none());
    }

    #[test]
    fn test_imports_and_unions_tags() {
        let snap = TempDir::new().unwrap();
        write_file(
            snap.path(),
            "a.json",
            r#"{"id": "a", "fields": {"label": "cat"}, "tags": ["saved"], "media": null}"#,
        );

        let mut dest = MemoryDataset::new("dest");
        let report = SnapshotReader::new()
            .read(snap.path(), &mut dest, &tags(&["reviewed"]))
            .unwrap();

        assert_eq!(report.succeeded, 1);
        let record = &dest.records().unwrap()[0];
        assert_ne!(record.id().as_str(), "a");
        assert!(record.has_tag("saved"));
        assert!(record.has_tag("reviewed"));
        assert_eq!(record.field("label"), Some(&FieldValue::from("cat")));
    }

    #[test]
    fn test_malformed_entry_does_not_abort() {
        let snap = TempDir::new().unwrap();
        write_file(snap.path(), "bad.json", r#"{"id": "bad", "fields": {"#);
        write_file(
            snap.path(),
            "good.json",
            r#"{"id": "good", "fields": {}, "tags": [], "media": null}"#,
        );
        write_file(snap.path(), "notes.txt", "ignored");

        let mut dest = MemoryDataset::new("dest");
        let report = SnapshotReader::new()
            .read(snap.path(), &mut dest, &TagSet::new())
            .unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.errored, 1);
        assert_eq!(report.errors().next().unwrap().item, "bad.json");
        assert_eq!(dest.len().unwrap(), 1);
    }

    #[test]
    fn test_missing_sibling_media_imports_metadata() {
        let snap = TempDir::new().unwrap();
        write_file(
            snap.path(),
            "a.json",
            r#"{"id": "a", "fields": {}, "tags": [], "media": "a.jpg"}"#,
        );

        let mut dest = MemoryDataset::new("dest");
        let report = SnapshotReader::new()
            .read(snap.path(), &mut dest, &TagSet::new())
            .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.warning_count(), 1);
        assert!(dest.records().unwrap()[0].media.is_none());
    }

    #[test]
    fn test_media_copied_into_media_dir() {
        let snap = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        write_file(snap.path(), "a.jpg", "jpeg");
        write_file(
            snap.path(),
            "a.json",
            r#"{"id": "a", "fields": {}, "tags": [], "media": "a.jpg"}"#,
        );

        let reader =
            SnapshotReader::with_options(ImportOptions::default().with_media_dir(store.path()));
        let mut dest = MemoryDataset::new("dest");
        reader.read(snap.path(), &mut dest, &TagSet::new()).unwrap();

        let record = &dest.records().unwrap()[0];
        let media = record.media.clone().unwrap();
        assert!(media.starts_with(store.path()));
        assert_eq!(
            media.file_name().unwrap().to_string_lossy(),
            format!("{}.jpg", record.id())
        );
        assert_eq!(fs::read(media).unwrap(), b"jpeg");
    }

    #[test]
    fn test_no_copy_references_snapshot_media() {
        let snap = TempDir::new().unwrap();
        let store = TempDir::new().unwrap();
        write_file(snap.path(), "a.jpg", "jpeg");
        write_file(
            snap.path(),
            "a.json",
            r#"{"id": "a", "fields": {}, "tags": [], "media": "a.jpg"}"#,
        );

        let reader = SnapshotReader::with_options(
            ImportOptions::default()
                .with_media_dir(store.path())
                .with_copy_media(false),
        );
        let mut dest = MemoryDataset::new("dest");
        reader.read(snap.path(), &mut dest, &TagSet::new()).unwrap();

        let media = dest.records().unwrap()[0].media.clone().unwrap();
        assert!(media.ends_with("a.jpg"));
        assert!(!media.starts_with(store.path()));
        assert_eq!(fs::read_dir(store.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_dry_run_inserts_nothing() {
        let snap = TempDir::new().unwrap();
        write_file(
            snap.path(),
            "a.json",
            r#"{"id": "a", "fields": {}, "tags": [], "media": null}"#,
        );

        let reader = SnapshotReader::with_options(ImportOptions::default().with_dry_run(true));
        let mut dest = MemoryDataset::new("dest");
        let report = reader.read(snap.path(), &mut dest, &TagSet::new()).unwrap();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.succeeded, 0);
        assert!(dest.is_empty().unwrap());
    }

    #[test]
    fn test_rejected_insert_is_reported() {
        let snap = TempDir::new().unwrap();
        write_file(
            snap.path(),
            "a.json",
            r#"{"id": "a", "fields": {"score": "high"}, "tags": [], "media": null}"#,
        );
        write_file(
            snap.path(),
            "b.json",
            r#"{"id": "b", "fields": {"score": 0.5}, "tags": [], "media": null}"#,
        );

        let mut dest = MemoryDataset::new("dest");
        dest.insert(Record::new("seed").with_field("score", 0.9))
            .unwrap();

        let report = SnapshotReader::new()
            .read(snap.path(), &mut dest, &TagSet::new())
            .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.errored, 1);
        assert_eq!(report.errors().next().unwrap().kind, Some("rejected"));
        assert_eq!(dest.len().unwrap(), 2);
    }

    #[test]
    fn test_missing_input_dir_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut dest = MemoryDataset::new("dest");
        let err = SnapshotReader::new()
            .read(dir.path().join("nope"), &mut dest, &TagSet::new())
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
