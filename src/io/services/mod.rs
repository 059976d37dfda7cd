//! Export and import service implementations.
//!
//! Orchestrate the adapter and the media locator over whole runs, folding
//! per-record failures into the run's report.

pub mod export;
pub mod import;

pub use export::{ExportOptions, SnapshotWriter};
pub use import::{ImportOptions, SnapshotReader};
