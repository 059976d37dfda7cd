//! Storage backend traits.

mod dataset;

pub use dataset::DatasetBackend;
