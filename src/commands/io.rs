//! Snapshot export and import command handlers.

use std::path::PathBuf;

use clap::Args;
use mediasnap::config::MediasnapConfig;
use mediasnap::models::{RecordId, RecordSelection};
use mediasnap::storage::{DatasetBackend, DatasetCatalog, MemoryDataset};
use mediasnap::{Error, ExportOptions, ImportOptions, Result, SnapshotReader, SnapshotWriter};

use super::{parse_tags, print_report, progress_line};

/// Arguments of the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Snapshot directory to write.
    pub out_dir: PathBuf,

    /// Dataset to export.
    #[arg(short, long)]
    pub dataset: String,

    /// Export only these record IDs (comma-separated).
    #[arg(long, value_delimiter = ',', conflicts_with = "tag")]
    pub ids: Vec<String>,

    /// Export only records carrying all of these tags (repeatable).
    #[arg(long)]
    pub tag: Vec<String>,

    /// Refuse to write into a directory that already holds entries.
    #[arg(long)]
    pub no_overwrite: bool,
}

/// Arguments of the import command.
#[derive(Args)]
pub struct ImportArgs {
    /// Snapshot directory to read.
    pub in_dir: PathBuf,

    /// Destination dataset, created if missing.
    #[arg(short, long)]
    pub dataset: String,

    /// Tags added to every imported record (comma-separated).
    #[arg(short, long)]
    pub tags: Option<String>,

    /// Directory imported media are copied into.
    #[arg(long)]
    pub media_dir: Option<PathBuf>,

    /// Reference snapshot media in place instead of copying.
    #[arg(long)]
    pub no_copy: bool,

    /// Validate the snapshot without inserting anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Builds the record selection from the export filters.
fn selection(args: &ExportArgs) -> RecordSelection {
    if !args.ids.is_empty() {
        RecordSelection::Ids(args.ids.iter().map(RecordId::new).collect())
    } else if !args.tag.is_empty() {
        RecordSelection::Tagged(args.tag.clone())
    } else {
        RecordSelection::All
    }
}

/// Executes the export command.
pub fn cmd_export(config: &MediasnapConfig, args: ExportArgs) -> Result<()> {
    let catalog = DatasetCatalog::new(&config.data_dir);
    let dataset = catalog.open(&args.dataset)?;
    let records = dataset.records()?;

    let selection = selection(&args);
    let selected = selection.apply(&records);
    if selected.is_empty() && !matches!(selection, RecordSelection::All) {
        return Err(Error::InvalidInput(format!(
            "no records in '{}' match {}",
            args.dataset,
            selection.describe()
        )));
    }
    println!(
        "Exporting {} ({} records) to {}",
        selection.describe(),
        selected.len(),
        args.out_dir.display()
    );

    let options = ExportOptions::default().with_overwrite(config.overwrite && !args.no_overwrite);
    let report = SnapshotWriter::with_options(options).write_with_progress(
        selected,
        &args.out_dir,
        Some(progress_line("Exporting")),
    )?;

    println!();
    print_report("Export completed", &report);
    Ok(())
}

/// Executes the import command.
pub fn cmd_import(config: &MediasnapConfig, args: ImportArgs) -> Result<()> {
    let tags = parse_tags(args.tags.as_deref());
    let media_dir = args
        .media_dir
        .clone()
        .unwrap_or_else(|| config.media_dir_for(&args.dataset));
    let options = ImportOptions::default()
        .with_media_dir(media_dir)
        .with_copy_media(config.copy_media && !args.no_copy)
        .with_dry_run(args.dry_run);
    let reader = SnapshotReader::with_options(options);
    let progress = Some(progress_line("Importing"));

    let catalog = DatasetCatalog::new(&config.data_dir);
    let report = if args.dry_run {
        // Validate against a scratch dataset so nothing is created on disk.
        let mut scratch = MemoryDataset::new(args.dataset.as_str());
        reader.read_with_progress(&args.in_dir, &mut scratch, &tags, progress)?
    } else {
        let mut dataset = catalog.open_or_create(&args.dataset)?;
        reader.read_with_progress(&args.in_dir, &mut dataset, &tags, progress)?
    };

    println!();
    if args.dry_run {
        print_report("Dry run completed (no changes made)", &report);
    } else {
        print_report("Import completed", &report);
    }
    Ok(())
}
