//! Snapshot writer.
//!
//! Writes a sequence of records into a snapshot directory. Records are
//! processed one at a time in input order; a failing record is reported and
//! skipped, and the run carries on.

use crate::io::adapter::to_canonical;
use crate::io::entry::{ENTRY_EXTENSION, SnapshotEntry};
use crate::io::media::{MediaLocator, MediaLookup, media_filename, sanitize_id};
use crate::io::report::{Operation, OperationReport, Progress, ProgressCallback};
use crate::models::Record;
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::instrument;

const WRITE_CHECK: &str = ".mediasnap-write-check";

/// Options for snapshot export.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Allow writing into a directory that already holds entry files.
    pub overwrite: bool,
    /// Treat file names differing only in ASCII case as a collision, for
    /// snapshots headed to case-insensitive filesystems.
    pub case_insensitive_names: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            overwrite: true,
            case_insensitive_names: false,
        }
    }
}

impl ExportOptions {
    /// Sets whether existing snapshot content may be overwritten.
    #[must_use]
    pub const fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets whether file names are compared ignoring ASCII case.
    #[must_use]
    pub const fn with_case_insensitive_names(mut self, enabled: bool) -> Self {
        self.case_insensitive_names = enabled;
        self
    }
}

/// Writes records to a snapshot directory.
#[derive(Debug, Clone, Default)]
pub struct SnapshotWriter {
    locator: MediaLocator,
    options: ExportOptions,
}

impl SnapshotWriter {
    /// Creates a writer with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with the given options.
    #[must_use]
    pub const fn with_options(options: ExportOptions) -> Self {
        Self {
            locator: MediaLocator::new(),
            options,
        }
    }

    /// Exports records into `out_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the output directory cannot be prepared,
    /// [`Error::InvalidInput`] if it already holds a snapshot and overwriting
    /// is disabled, and [`Error::Collision`] if two records map to the same
    /// file name. Nothing is written in any of these cases. Per-record
    /// failures are reported, not returned.
    pub fn write<'a, I>(&self, records: I, out_dir: impl AsRef<Path>) -> Result<OperationReport>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        self.write_with_progress(records, out_dir, None)
    }

    /// Exports records into `out_dir`, reporting progress after each record.
    ///
    /// # Errors
    ///
    /// See [`Self::write`].
    #[instrument(skip_all, fields(out_dir = %out_dir.as_ref().display()))]
    pub fn write_with_progress<'a, I>(
        &self,
        records: I,
        out_dir: impl AsRef<Path>,
        progress: Option<ProgressCallback>,
    ) -> Result<OperationReport>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let out_dir = out_dir.as_ref();
        let records: Vec<&Record> = records.into_iter().collect();
        let stems = assign_stems(&records, self.options.case_insensitive_names)?;

        self.prepare_dir(out_dir)?;
        tracing::info!(records = records.len(), "Exporting records");

        let total = records.len();
        let mut report = OperationReport::new(Operation::Export);
        for (record, stem) in records.into_iter().zip(stems) {
            match self.export_record(record, &stem, out_dir, &mut report) {
                Ok(()) => report.record_success(),
                Err(e) => report.record_error(record.id().as_str(), &e),
            }
            if let Some(ref cb) = progress {
                cb(&Progress::of(&report, total));
            }
        }

        report.finish();
        Ok(report)
    }

    /// Writes one record's media and entry file.
    fn export_record(
        &self,
        record: &Record,
        stem: &str,
        out_dir: &Path,
        report: &mut OperationReport,
    ) -> Result<()> {
        let mut entry = to_canonical(record);
        entry.validate()?;

        let mut created_media = None;
        if entry.media.is_some() {
            let copied = self.export_media(record, stem, out_dir, report)?;
            if let Some((ref name, true)) = copied {
                created_media = Some(out_dir.join(name));
            }
            entry.media = copied.map(|(name, _)| name);
        }

        write_entry(out_dir, stem, &entry).inspect_err(|_| {
            if let Some(orphan) = created_media {
                let _ = fs::remove_file(orphan);
            }
        })
    }

    /// Copies a record's media next to its entry.
    ///
    /// Returns the media file name and whether the copy created a new file,
    /// or `None` when the record has to be exported without media.
    fn export_media(
        &self,
        record: &Record,
        stem: &str,
        out_dir: &Path,
        report: &mut OperationReport,
    ) -> Result<Option<(String, bool)>> {
        let handle = match self.locator.locate(record) {
            MediaLookup::Found(handle) => handle,
            MediaLookup::NotFound(reason) => {
                report.add_warning(record.id().as_str(), format!("media not found: {reason}"));
                return Ok(None);
            },
        };

        // `<stem>.json` media would replace the record's own entry file.
        if handle
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ENTRY_EXTENSION))
        {
            report.add_warning(
                record.id().as_str(),
                format!(
                    "media {} has the reserved .{ENTRY_EXTENSION} extension and was not copied",
                    handle.path.display()
                ),
            );
            return Ok(None);
        }

        let created = !out_dir.join(media_filename(stem, &handle.path)).exists();
        let name = self.locator.copy_into(&handle, out_dir, stem)?;
        metrics::counter!("snapshot_media_bytes_total", "operation" => "export")
            .increment(handle.size);
        Ok(Some((name, created)))
    }

    /// Creates the output directory and checks that it is writable.
    fn prepare_dir(&self, out_dir: &Path) -> Result<()> {
        if out_dir.exists() && !out_dir.is_dir() {
            return Err(Error::Io {
                operation: "prepare_output_dir".to_string(),
                path: out_dir.display().to_string(),
                cause: "exists and is not a directory".to_string(),
            });
        }
        fs::create_dir_all(out_dir).map_err(|e| Error::io("create_output_dir", out_dir, &e))?;

        if !self.options.overwrite && contains_entries(out_dir)? {
            return Err(Error::InvalidInput(format!(
                "{} already contains a snapshot and overwrite is disabled",
                out_dir.display()
            )));
        }

        let marker = out_dir.join(WRITE_CHECK);
        fs::write(&marker, b"").map_err(|e| Error::io("check_output_dir", out_dir, &e))?;
        let _ = fs::remove_file(&marker);
        Ok(())
    }
}

/// Computes each record's file stem, failing on any clash.
///
/// With `fold_case`, stems differing only in ASCII case also clash.
fn assign_stems(records: &[&Record], fold_case: bool) -> Result<Vec<String>> {
    let mut claimed: HashMap<String, &str> = HashMap::with_capacity(records.len());
    let mut stems = Vec::with_capacity(records.len());

    for record in records {
        let id = record.id().as_str();
        let stem = sanitize_id(id);
        let key = if fold_case {
            stem.to_ascii_lowercase()
        } else {
            stem.clone()
        };
        if let Some(first) = claimed.insert(key, id) {
            return Err(Error::Collision {
                first: first.to_string(),
                second: id.to_string(),
                filename: format!("{stem}.{ENTRY_EXTENSION}"),
            });
        }
        stems.push(stem);
    }
    Ok(stems)
}

/// Returns whether a directory already holds entry files.
fn contains_entries(dir: &Path) -> Result<bool> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io("read_output_dir", dir, &e))?;
    Ok(entries.filter_map(std::result::Result::ok).any(|entry| {
        entry
            .path()
            .extension()
            .is_some_and(|ext| ext == ENTRY_EXTENSION)
    }))
}

/// Writes an entry file through a temporary file and a rename.
fn write_entry(out_dir: &Path, stem: &str, entry: &SnapshotEntry) -> Result<()> {
    let bytes = entry.to_json_bytes()?;
    let filename = format!("{stem}.{ENTRY_EXTENSION}");
    let path = out_dir.join(&filename);
    let partial = out_dir.join(format!(".{filename}.partial"));

    fs::write(&partial, &bytes).map_err(|e| {
        let _ = fs::remove_file(&partial);
        Error::io("write_entry", &partial, &e)
    })?;
    fs::rename(&partial, &path).map_err(|e| {
        let _ = fs::remove_file(&partial);
        Error::io("rename_entry", &path, &e)
    })?;

    tracing::debug!(path = %path.display(), media = ?entry.media, "Wrote snapshot entry");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::entry::parse_entry;
    use crate::models::FieldValue;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn read_entry(dir: &Path, stem: &str) -> SnapshotEntry {
        parse_entry(&fs::read(dir.join(format!("{stem}.json"))).unwrap()).unwrap()
    }

    #[test]
    fn test_export_options_defaults() {
        assert!(ExportOptions::default().overwrite);
        assert!(!ExportOptions::default().with_overwrite(false).overwrite);
        assert!(!ExportOptions::default().case_insensitive_names);
    }

    #[test]
    fn test_writes_entry_and_media() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let media = src.path().join("photo.png");
        fs::write(&media, b"png-bytes").unwrap();

        let records = [Record::new("a").with_media(&media).with_field("label", "cat")];
        let report = SnapshotWriter::new().write(&records, out.path()).unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.warning_count(), 0);
        let entry = read_entry(out.path(), "a");
        assert_eq!(entry.media.as_deref(), Some("a.png"));
        assert_eq!(fs::read(out.path().join("a.png")).unwrap(), b"png-bytes");
        assert!(!out.path().join(WRITE_CHECK).exists());
    }

    #[test]
    fn test_missing_media_is_warning() {
        let out = TempDir::new().unwrap();
        let records = [Record::new("c").with_media("/missing/c.jpg")];

        let report = SnapshotWriter::new().write(&records, out.path()).unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.errored, 0);
        assert_eq!(report.warning_count(), 1);
        assert!(read_entry(out.path(), "c").media.is_none());
    }

    #[test]
    fn test_serialization_failure_is_isolated() {
        let out = TempDir::new().unwrap();
        let records = [
            Record::new("ok1").with_field("x", 1_i64),
            Record::new("bad").with_field("x", f64::NAN),
            Record::new("ok2").with_field("x", 2_i64),
        ];

        let report = SnapshotWriter::new().write(&records, out.path()).unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.errored, 1);
        assert!(out.path().join("ok1.json").exists());
        assert!(!out.path().join("bad.json").exists());
        assert!(out.path().join("ok2.json").exists());
    }

    #[test]
    fn test_collision_writes_nothing() {
        let out = TempDir::new().unwrap();
        let records = [Record::new("a/b"), Record::new("a_b")];

        let err = SnapshotWriter::new().write(&records, out.path()).unwrap_err();

        assert!(matches!(err, Error::Collision { ref filename, .. } if filename == "a_b.json"));
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_names_differing_in_case_do_not_collide() {
        let out = TempDir::new().unwrap();
        let records = [Record::new("Cat"), Record::new("cat")];

        let report = SnapshotWriter::new().write(&records, out.path()).unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(read_entry(out.path(), "Cat").id, "Cat");
        assert_eq!(read_entry(out.path(), "cat").id, "cat");
    }

    #[test]
    fn test_case_folding_collision_when_enabled() {
        let out = TempDir::new().unwrap();
        let records = [Record::new("Cat"), Record::new("cat")];
        let writer =
            SnapshotWriter::with_options(ExportOptions::default().with_case_insensitive_names(true));

        let err = writer.write(&records, out.path()).unwrap_err();

        assert!(matches!(
            err,
            Error::Collision { ref first, ref second, .. } if first == "Cat" && second == "cat"
        ));
        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_media_copy_failure_is_isolated() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let records: Vec<Record> = ["a", "b", "c"]
            .iter()
            .map(|id| {
                let media = src.path().join(format!("{id}.jpg"));
                fs::write(&media, id.as_bytes()).unwrap();
                Record::new(*id).with_media(media)
            })
            .collect();
        // A directory squatting on b's media name makes the copy fail.
        fs::create_dir(out.path().join("b.jpg")).unwrap();

        let report = SnapshotWriter::new().write(&records, out.path()).unwrap();

        assert_eq!(report.processed, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.errored, 1);
        let error = report.errors().next().unwrap();
        assert_eq!(error.item, "b");
        assert_eq!(error.kind, Some("io"));
        assert!(out.path().join("a.json").exists());
        assert!(!out.path().join("b.json").exists());
        assert!(out.path().join("c.json").exists());
        assert!(!out.path().join(".b.jpg.partial").exists());
    }

    #[test]
    fn test_entry_failure_removes_copied_media() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let media = src.path().join("a.jpg");
        fs::write(&media, b"jpg").unwrap();
        // A directory squatting on the entry name makes the entry write fail.
        fs::create_dir(out.path().join("a.json")).unwrap();

        let records = [Record::new("a").with_media(&media)];
        let report = SnapshotWriter::new().write(&records, out.path()).unwrap();

        assert_eq!(report.errored, 1);
        assert_eq!(report.errors().next().unwrap().kind, Some("io"));
        assert!(!out.path().join("a.jpg").exists());
        assert!(!out.path().join(".a.json.partial").exists());
    }

    #[test]
    fn test_entry_failure_keeps_previous_media() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let media = src.path().join("a.jpg");
        fs::write(&media, b"jpg").unwrap();
        fs::write(out.path().join("a.jpg"), b"old").unwrap();
        fs::create_dir(out.path().join("a.json")).unwrap();

        let records = [Record::new("a").with_media(&media)];
        let report = SnapshotWriter::new().write(&records, out.path()).unwrap();

        assert_eq!(report.errored, 1);
        assert!(out.path().join("a.jpg").exists());
    }

    #[test]
    fn test_output_path_is_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, b"").unwrap();

        let err = SnapshotWriter::new()
            .write(&[Record::new("a")], &file)
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_no_overwrite_refuses_existing_snapshot() {
        let out = TempDir::new().unwrap();
        let records = [Record::new("a")];
        SnapshotWriter::new().write(&records, out.path()).unwrap();

        let writer = SnapshotWriter::with_options(ExportOptions::default().with_overwrite(false));
        let err = writer.write(&records, out.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_json_media_not_copied() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let media = src.path().join("labels.json");
        fs::write(&media, b"{}").unwrap();

        let records = [Record::new("a").with_media(&media).with_field("k", "v")];
        let report = SnapshotWriter::new().write(&records, out.path()).unwrap();

        assert_eq!(report.warning_count(), 1);
        let entry = read_entry(out.path(), "a");
        assert!(entry.media.is_none());
        assert_eq!(entry.fields["k"], FieldValue::from("v"));
    }

    #[test]
    fn test_progress_called_per_record() {
        let out = TempDir::new().unwrap();
        let records = [Record::new("1"), Record::new("2"), Record::new("3")];
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        SnapshotWriter::new()
            .write_with_progress(
                &records,
                out.path(),
                Some(Box::new(move |p: &Progress| {
                    assert_eq!(p.total, 3);
                    seen.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
