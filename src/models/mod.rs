//! Data models for mediasnap.
//!
//! Records, their field values, and the selections used to pick which
//! records take part in an export.

mod record;
mod selection;
mod value;

pub use record::{Record, RecordId, TagSet};
pub use selection::RecordSelection;
pub use value::{FieldValue, Fields};
