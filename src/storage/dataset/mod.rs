//! Reference dataset implementations.
//!
//! | Backend | Persistence | Media store |
//! |---------|-------------|-------------|
//! | [`MemoryDataset`] | None | Optional, caller supplied |
//! | [`FilesystemDataset`] | JSON file per record | `<root>/media` |

mod catalog;
mod filesystem;
mod memory;

pub use catalog::DatasetCatalog;
pub use filesystem::FilesystemDataset;
pub use memory::MemoryDataset;

/// Checks if a name is safe to use as a single path component.
///
/// Only alphanumerics, dashes and underscores are allowed, so `..`,
/// separators and NUL can never reach the filesystem.
pub(crate) fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 255
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
