//! Command handlers module.
//!
//! - `io.rs`: snapshot export and import
//! - `dataset.rs`: dataset listing and media ingestion

mod dataset;
mod io;

use mediasnap::OperationReport;
use mediasnap::io::{Progress, ProgressCallback};
use mediasnap::models::TagSet;

pub use dataset::{DatasetAction, cmd_dataset};
pub use io::{ExportArgs, ImportArgs, cmd_export, cmd_import};

/// Maximum number of warnings or errors listed in a summary.
const MAX_LISTED_ISSUES: usize = 10;

/// Parses a comma-separated tag list, dropping blanks.
pub fn parse_tags(tags: Option<&str>) -> TagSet {
    tags.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Prints the closing summary of an operation.
pub fn print_report(heading: &str, report: &OperationReport) {
    println!();
    println!("{heading}:");
    println!("  Succeeded:        {}", report.succeeded);
    println!("  Skipped:          {}", report.skipped);
    println!("  Errored:          {}", report.errored);
    println!("  Total processed:  {}", report.processed);

    print_issues("Warnings", report.warnings().map(ToString::to_string).collect());
    print_issues("Errors", report.errors().map(ToString::to_string).collect());
}

fn print_issues(label: &str, issues: Vec<String>) {
    if issues.is_empty() {
        return;
    }
    println!();
    println!("{label} ({}):", issues.len());
    for issue in issues.iter().take(MAX_LISTED_ISSUES) {
        println!("  - {issue}");
    }
    if issues.len() > MAX_LISTED_ISSUES {
        println!("  ... and {} more", issues.len() - MAX_LISTED_ISSUES);
    }
}

/// Progress callback printing a single updating line.
pub fn progress_line(verb: &'static str) -> ProgressCallback {
    Box::new(move |progress: &Progress| {
        print!(
            "\r{verb}: {}/{} ({:.1}%) - Errors: {}",
            progress.processed,
            progress.total,
            progress.percent_complete(),
            progress.errored,
        );
        use std::io::Write;
        let _ = std::io::stdout().flush();
    })
}
