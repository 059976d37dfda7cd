//! Operation reports.
//!
//! Every export, import and ingest run accumulates an [`OperationReport`]:
//! counters plus one [`ReportIssue`] per warning or error. Reports are
//! returned to the caller and logged, never persisted.

use crate::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Kind of run a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Records written to a snapshot directory.
    Export,
    /// Snapshot entries inserted into a dataset.
    Import,
    /// Media files registered as new records.
    Ingest,
}

impl Operation {
    /// Returns the operation name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Export => "export",
            Self::Import => "import",
            Self::Ingest => "ingest",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a report issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    /// The item was processed in degraded form (for example without media).
    Warning,
    /// The item was not processed.
    Error,
}

/// A problem attached to one item of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportIssue {
    /// Record identifier or entry file name the issue concerns.
    pub item: String,
    /// Description of the problem.
    pub reason: String,
    /// Severity of the issue.
    pub severity: IssueSeverity,
    /// Error kind label for errors (`io`, `parse`, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

impl fmt::Display for ReportIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.item, self.reason)
    }
}

/// Summary of one run.
///
/// `succeeded + skipped + errored == processed` holds once the run is done.
#[derive(Debug, Clone, Serialize)]
pub struct OperationReport {
    /// Kind of run.
    pub operation: Operation,
    /// Items looked at.
    pub processed: usize,
    /// Items fully handled (possibly with warnings).
    pub succeeded: usize,
    /// Items intentionally left out (dry run).
    pub skipped: usize,
    /// Items that failed.
    pub errored: usize,
    /// Warnings and errors in the order they occurred.
    pub issues: Vec<ReportIssue>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: Option<DateTime<Utc>>,
}

impl OperationReport {
    /// Starts an empty report.
    #[must_use]
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            processed: 0,
            succeeded: 0,
            skipped: 0,
            errored: 0,
            issues: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Counts a successfully handled item.
    pub fn record_success(&mut self) {
        self.processed += 1;
        self.succeeded += 1;
        metrics::counter!(
            "snapshot_records_total",
            "operation" => self.operation.as_str(),
            "outcome" => "success"
        )
        .increment(1);
    }

    /// Counts an item left out on purpose.
    pub fn record_skip(&mut self) {
        self.processed += 1;
        self.skipped += 1;
        metrics::counter!(
            "snapshot_records_total",
            "operation" => self.operation.as_str(),
            "outcome" => "skipped"
        )
        .increment(1);
    }

    /// Counts a failed item and keeps the error.
    pub fn record_error(&mut self, item: impl Into<String>, err: &Error) {
        let item = item.into();
        tracing::error!(
            operation = self.operation.as_str(),
            item = %item,
            kind = err.kind(),
            error = %err,
            "Item failed"
        );
        self.processed += 1;
        self.errored += 1;
        self.issues.push(ReportIssue {
            item,
            reason: err.to_string(),
            severity: IssueSeverity::Error,
            kind: Some(err.kind()),
        });
        metrics::counter!(
            "snapshot_records_total",
            "operation" => self.operation.as_str(),
            "outcome" => "error"
        )
        .increment(1);
    }

    /// Adds a warning. Does not change any counter.
    pub fn add_warning(&mut self, item: impl Into<String>, reason: impl Into<String>) {
        let item = item.into();
        let reason = reason.into();
        tracing::warn!(
            operation = self.operation.as_str(),
            item = %item,
            reason = %reason,
            "Item degraded"
        );
        self.issues.push(ReportIssue {
            item,
            reason,
            severity: IssueSeverity::Warning,
            kind: None,
        });
    }

    /// Returns the warnings.
    pub fn warnings(&self) -> impl Iterator<Item = &ReportIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
    }

    /// Returns the errors.
    pub fn errors(&self) -> impl Iterator<Item = &ReportIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error)
    }

    /// Returns the number of warnings.
    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    /// Returns whether any item failed.
    #[must_use]
    pub const fn has_errors(&self) -> bool {
        self.errored > 0
    }

    /// Marks the run as finished and logs the summary.
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
        tracing::info!(
            operation = self.operation.as_str(),
            processed = self.processed,
            succeeded = self.succeeded,
            skipped = self.skipped,
            errored = self.errored,
            warnings = self.warning_count(),
            "Run finished"
        );
    }
}

/// Progress snapshot handed to progress callbacks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Items processed so far.
    pub processed: usize,
    /// Items that succeeded so far.
    pub succeeded: usize,
    /// Items that failed so far.
    pub errored: usize,
    /// Total items in the run.
    pub total: usize,
}

impl Progress {
    /// Builds a progress value from a report in flight.
    #[must_use]
    pub const fn of(report: &OperationReport, total: usize) -> Self {
        Self {
            processed: report.processed,
            succeeded: report.succeeded,
            errored: report.errored,
            total,
        }
    }

    /// Returns the percentage complete (0-100).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_complete(&self) -> f32 {
        if self.total == 0 {
            100.0
        } else {
            (self.processed as f32 / self.total as f32) * 100.0
        }
    }
}

/// Progress callback for export and import runs.
pub type ProgressCallback = Box<dyn Fn(&Progress) + Send>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_balance() {
        let mut report = OperationReport::new(Operation::Import);
        report.record_success();
        report.record_skip();
        report.record_error("bad.json", &Error::Parse("eof".to_string()));
        report.add_warning("a", "media missing");
        report.finish();

        assert_eq!(report.processed, 3);
        assert_eq!(
            report.succeeded + report.skipped + report.errored,
            report.processed
        );
        assert_eq!(report.warning_count(), 1);
        assert!(report.has_errors());
        assert!(report.finished_at.is_some());

        let error = report.errors().next().unwrap();
        assert_eq!(error.item, "bad.json");
        assert_eq!(error.kind, Some("parse"));
    }

    #[test]
    fn test_progress_percent() {
        let progress = Progress {
            processed: 5,
            total: 20,
            ..Default::default()
        };
        assert!((progress.percent_complete() - 25.0).abs() < f32::EPSILON);
        assert!((Progress::default().percent_complete() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_report_serializes() {
        let mut report = OperationReport::new(Operation::Export);
        report.add_warning("c", "no such file");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["operation"], "export");
        assert_eq!(json["issues"][0]["severity"], "warning");
    }
}
