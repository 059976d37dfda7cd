//! Record selection.
//!
//! Picks which records of a dataset take part in an export: the whole
//! dataset, an explicit list of selected records, or a tag-filtered view.

use super::{Record, RecordId};

/// Which records to export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RecordSelection {
    /// Every record in the dataset.
    #[default]
    All,
    /// Only the records with these identifiers.
    Ids(Vec<RecordId>),
    /// Records carrying all of these tags.
    Tagged(Vec<String>),
}

impl RecordSelection {
    /// Returns whether a record belongs to the selection.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Ids(ids) => ids.contains(record.id()),
            Self::Tagged(tags) => tags.iter().all(|t| record.has_tag(t)),
        }
    }

    /// Applies the selection, keeping the order of `records`.
    pub fn apply<'a, I>(&self, records: I) -> Vec<&'a Record>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        records.into_iter().filter(|r| self.matches(r)).collect()
    }

    /// Returns a short description for logs and summaries.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::All => "entire dataset".to_string(),
            Self::Ids(ids) => format!("{} selected records", ids.len()),
            Self::Tagged(tags) => format!("records tagged {}", tags.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        vec![
            Record::new("1").with_tag("train"),
            Record::new("2").with_tag("train").with_tag("reviewed"),
            Record::new("3").with_tag("val"),
        ]
    }

    #[test]
    fn test_all_keeps_everything() {
        let records = sample();
        assert_eq!(RecordSelection::All.apply(&records).len(), 3);
    }

    #[test]
    fn test_ids_keeps_stored_order() {
        let records = sample();
        let selection = RecordSelection::Ids(vec![RecordId::new("3"), RecordId::new("1")]);
        let picked: Vec<_> = selection
            .apply(&records)
            .iter()
            .map(|r| r.id().as_str())
            .collect();
        assert_eq!(picked, vec!["1", "3"]);
    }

    #[test]
    fn test_tagged_requires_all_tags() {
        let records = sample();
        let selection =
            RecordSelection::Tagged(vec!["train".to_string(), "reviewed".to_string()]);
        let picked = selection.apply(&records);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].id().as_str(), "2");
    }
}
