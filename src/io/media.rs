//! Media locator.
//!
//! Finds a record's media file, copies it under a collision-free name, and
//! resolves media referenced from a snapshot directory. A missing or
//! unreadable file is reported as [`MediaLookup::NotFound`], never as an
//! error: records without usable media are common and still exportable.

use crate::models::Record;
use crate::{Error, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Longest sanitized stem, in bytes. Leaves room for an extension within
/// the usual 255-byte file name limit.
const MAX_STEM_LEN: usize = 200;

/// A media file confirmed to exist and be readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Size in bytes at lookup time.
    pub size: u64,
}

impl MediaHandle {
    /// Returns the file extension, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }
}

/// Outcome of a media lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaLookup {
    /// The file exists and can be read.
    Found(MediaHandle),
    /// No usable file; carries a human-readable reason.
    NotFound(String),
}

impl MediaLookup {
    /// Returns the handle if the media was found.
    #[must_use]
    pub const fn found(&self) -> Option<&MediaHandle> {
        match self {
            Self::Found(handle) => Some(handle),
            Self::NotFound(_) => None,
        }
    }
}

/// Maps an identifier to a string safe to use as a file stem.
///
/// Every character other than ASCII alphanumerics, `-` and `_` becomes `_`.
/// The result is truncated to a bounded length and is never empty. Distinct
/// identifiers may map to the same stem; callers that need uniqueness must
/// check for collisions.
#[must_use]
pub fn sanitize_id(id: &str) -> String {
    let mut stem: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    // Only ASCII remains, so byte truncation lands on a char boundary.
    stem.truncate(MAX_STEM_LEN);
    if stem.is_empty() {
        stem.push('_');
    }
    stem
}

/// Builds the file name for media stored under `stem`, keeping the source
/// file's extension.
#[must_use]
pub fn media_filename(stem: &str, source: &Path) -> String {
    match source.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{stem}.{ext}"),
        _ => stem.to_string(),
    }
}

/// Locates, copies and resolves media files.
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaLocator;

impl MediaLocator {
    /// Creates a media locator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Resolves a record's media reference.
    ///
    /// Relative paths are resolved against the current directory.
    #[must_use]
    pub fn locate(&self, record: &Record) -> MediaLookup {
        let Some(path) = record.media_path() else {
            return MediaLookup::NotFound("no media reference".to_string());
        };
        let path = match std::path::absolute(path) {
            Ok(p) => p,
            Err(e) => return MediaLookup::NotFound(format!("{}: {e}", path.display())),
        };
        Self::inspect(path)
    }

    /// Copies media into `dest_dir` as `<stem>.<ext>`.
    ///
    /// An existing file with that name is replaced. The copy goes through a
    /// temporary file and a rename, so the destination name never refers to
    /// a partially written file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the source cannot be read or the destination
    /// cannot be written.
    pub fn copy_into(&self, media: &MediaHandle, dest_dir: &Path, stem: &str) -> Result<String> {
        let filename = media_filename(stem, &media.path);
        let target = dest_dir.join(&filename);

        if target == media.path {
            return Ok(filename);
        }

        let partial = dest_dir.join(format!(".{filename}.partial"));
        let copied = fs::copy(&media.path, &partial).map_err(|e| {
            let _ = fs::remove_file(&partial);
            Error::io("copy_media", &media.path, &e)
        })?;
        fs::rename(&partial, &target).map_err(|e| {
            let _ = fs::remove_file(&partial);
            Error::io("rename_media", &target, &e)
        })?;

        tracing::debug!(
            source = %media.path.display(),
            target = %target.display(),
            bytes = copied,
            "Copied media file"
        );
        Ok(filename)
    }

    /// Resolves a media name referenced by a snapshot entry.
    ///
    /// Names that are empty, contain directory components, or point at a
    /// file that does not exist resolve to [`MediaLookup::NotFound`].
    #[must_use]
    pub fn resolve_from_snapshot(&self, snapshot_dir: &Path, name: Option<&str>) -> MediaLookup {
        let Some(name) = name.filter(|n| !n.is_empty()) else {
            return MediaLookup::NotFound("entry has no media".to_string());
        };
        if !is_plain_filename(name) {
            return MediaLookup::NotFound(format!("media name '{name}' is not a plain file name"));
        }
        let joined = snapshot_dir.join(name);
        let path = std::path::absolute(&joined).unwrap_or(joined);
        Self::inspect(path)
    }

    fn inspect(path: PathBuf) -> MediaLookup {
        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => return MediaLookup::NotFound(format!("{}: {e}", path.display())),
        };
        if !metadata.is_file() {
            return MediaLookup::NotFound(format!("{} is not a regular file", path.display()));
        }
        if let Err(e) = fs::File::open(&path) {
            return MediaLookup::NotFound(format!("{} is unreadable: {e}", path.display()));
        }
        MediaLookup::Found(MediaHandle {
            path,
            size: metadata.len(),
        })
    }
}

/// Returns whether `name` is a single normal path component.
fn is_plain_filename(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_case::test_case;

    #[test_case("abc-123_X", "abc-123_X" ; "already safe")]
    #[test_case("a/b", "a_b" ; "slash")]
    #[test_case("../etc/passwd", "___etc_passwd" ; "traversal")]
    #[test_case("a b.c", "a_b_c" ; "space and dot")]
    #[test_case("ünï", "_n_" ; "non ascii")]
    #[test_case("", "_" ; "empty")]
    fn test_sanitize_id(input: &str, expected: &str) {
        assert_eq!(sanitize_id(input), expected);
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(500);
        assert_eq!(sanitize_id(&long).len(), MAX_STEM_LEN);
    }

    #[test]
    fn test_media_filename_keeps_extension() {
        assert_eq!(media_filename("a", Path::new("/tmp/pic.JPG")), "a.JPG");
        assert_eq!(media_filename("a", Path::new("/tmp/archive.tar.gz")), "a.gz");
        assert_eq!(media_filename("a", Path::new("/tmp/noext")), "a");
    }

    #[test]
    fn test_locate_missing_and_unset() {
        let locator = MediaLocator::new();

        let missing = Record::new("c").with_media("/definitely/missing/c.jpg");
        assert!(matches!(locator.locate(&missing), MediaLookup::NotFound(_)));

        let unset = Record::new("b");
        assert!(matches!(locator.locate(&unset), MediaLookup::NotFound(_)));

        let empty = Record::new("e").with_media("");
        assert!(matches!(locator.locate(&empty), MediaLookup::NotFound(_)));
    }

    #[test]
    fn test_locate_directory_is_not_found() {
        let dir = TempDir::new().unwrap();
        let record = Record::new("d").with_media(dir.path());
        assert!(matches!(
            MediaLocator::new().locate(&record),
            MediaLookup::NotFound(ref reason) if reason.contains("not a regular file")
        ));
    }

    #[test]
    fn test_copy_into_overwrites() {
        let src_dir = TempDir::new().unwrap();
        let dest_dir = TempDir::new().unwrap();
        let source = src_dir.path().join("a.jpg");
        fs::write(&source, b"new bytes").unwrap();
        fs::write(dest_dir.path().join("a.jpg"), b"stale").unwrap();

        let locator = MediaLocator::new();
        let handle = locator
            .locate(&Record::new("a").with_media(&source))
            .found()
            .cloned()
            .unwrap();
        assert_eq!(handle.size, 9);

        let name = locator.copy_into(&handle, dest_dir.path(), "a").unwrap();
        assert_eq!(name, "a.jpg");
        assert_eq!(fs::read(dest_dir.path().join("a.jpg")).unwrap(), b"new bytes");
        assert!(!dest_dir.path().join(".a.jpg.partial").exists());
    }

    #[test]
    fn test_copy_into_missing_destination_fails() {
        let src_dir = TempDir::new().unwrap();
        let source = src_dir.path().join("a.png");
        fs::write(&source, b"png").unwrap();
        let handle = MediaHandle {
            path: source,
            size: 3,
        };

        let err = MediaLocator::new()
            .copy_into(&handle, &src_dir.path().join("no/such/dir"), "a")
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_resolve_from_snapshot() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.jpg"), b"jpg").unwrap();
        let locator = MediaLocator::new();

        assert!(locator.resolve_from_snapshot(dir.path(), Some("a.jpg")).found().is_some());
        assert!(locator.resolve_from_snapshot(dir.path(), Some("b.jpg")).found().is_none());
        assert!(locator.resolve_from_snapshot(dir.path(), None).found().is_none());
        assert!(locator.resolve_from_snapshot(dir.path(), Some("")).found().is_none());
        assert!(
            locator
                .resolve_from_snapshot(dir.path(), Some("../a.jpg"))
                .found()
                .is_none()
        );
        assert!(
            locator
                .resolve_from_snapshot(dir.path(), Some("sub/a.jpg"))
                .found()
                .is_none()
        );
    }
}
