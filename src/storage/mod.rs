//! Dataset storage.
//!
//! The snapshot engine talks to datasets only through [`DatasetBackend`].
//! Two reference backends are provided:
//! - **Memory**: [`MemoryDataset`], for tests and embedding
//! - **Filesystem**: [`FilesystemDataset`], JSON file per record, grouped
//!   into named datasets by a [`DatasetCatalog`]

pub mod dataset;
pub mod ingest;
pub mod schema;
pub mod traits;

pub use dataset::{DatasetCatalog, FilesystemDataset, MemoryDataset};
pub use ingest::{MEDIA_EXTENSIONS, ingest_media_dir, is_media_file};
pub use schema::FieldSchema;
pub use traits::DatasetBackend;
