//! Dataset management command handlers.

use std::path::PathBuf;

use clap::Subcommand;
use mediasnap::config::MediasnapConfig;
use mediasnap::storage::{DatasetBackend, DatasetCatalog, ingest_media_dir};
use mediasnap::Result;

use super::{parse_tags, print_report};

/// Dataset subcommands.
#[derive(Subcommand)]
pub enum DatasetAction {
    /// List datasets and their record counts.
    List,

    /// Add a record for every media file in a directory.
    Ingest {
        /// Directory holding the media files.
        dir: PathBuf,

        /// Dataset to add records to, created if missing.
        #[arg(short, long)]
        dataset: String,

        /// Tags for the new records (comma-separated).
        #[arg(short, long)]
        tags: Option<String>,
    },
}

/// Executes a dataset subcommand.
pub fn cmd_dataset(config: &MediasnapConfig, action: DatasetAction) -> Result<()> {
    let catalog = DatasetCatalog::new(&config.data_dir);
    match action {
        DatasetAction::List => {
            let names = catalog.list()?;
            if names.is_empty() {
                println!("No datasets in {}", catalog.data_dir().display());
                return Ok(());
            }
            for name in names {
                let dataset = catalog.open(&name)?;
                println!("{name:<32} {:>8} records", dataset.len()?);
            }
            Ok(())
        },
        DatasetAction::Ingest { dir, dataset, tags } => {
            let mut target = catalog.open_or_create(&dataset)?;
            let report = ingest_media_dir(&mut target, &dir, &parse_tags(tags.as_deref()))?;
            print_report("Ingest completed", &report);
            Ok(())
        },
    }
}
