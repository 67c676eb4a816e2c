//! Per-scan state threaded through the walker.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::Span;

use persondup_core::{PersonRecord, ScanWarning, SkipReason};

/// Person records collected from one scan unit, in insertion order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Batch {
    /// Records in the order they were read.
    pub records: Vec<PersonRecord>,
    /// Files parsed successfully.
    pub files_processed: u64,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: PersonRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// What happened to one JSON file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Parsed; `records` were emitted and `skipped` elements produced none.
    Parsed { records: usize, skipped: usize },
    /// Could not be read or parsed and was skipped.
    Failed,
}

/// Counters and warnings for a run or a part of it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    /// JSON files visited.
    pub files_seen: u64,
    /// JSON files parsed.
    pub files_processed: u64,
    /// JSON files skipped because they could not be read or parsed.
    pub files_failed: u64,
    /// Records emitted.
    pub records_extracted: u64,
    /// Elements without a general data section.
    pub records_without_data: u64,
    /// Elements rejected by the name guard.
    pub records_without_names: u64,
    /// Elements with an unexpected shape.
    pub records_malformed: u64,
    /// Non-fatal problems, in the order they occurred.
    pub warnings: Vec<ScanWarning>,
}

impl RunReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a skipped element.
    pub fn record_skip(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::NoGeneralData => self.records_without_data += 1,
            SkipReason::MissingNames => self.records_without_names += 1,
            SkipReason::NotAnObject { .. } | SkipReason::NotAScalar { .. } => {
                self.records_malformed += 1
            }
        }
    }

    pub fn record_warning(&mut self, warning: ScanWarning) {
        self.warnings.push(warning);
    }

    /// Total elements that produced no record.
    pub fn records_skipped(&self) -> u64 {
        self.records_without_data + self.records_without_names + self.records_malformed
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: RunReport) {
        self.files_seen += other.files_seen;
        self.files_processed += other.files_processed;
        self.files_failed += other.files_failed;
        self.records_extracted += other.records_extracted;
        self.records_without_data += other.records_without_data;
        self.records_without_names += other.records_without_names;
        self.records_malformed += other.records_malformed;
        self.warnings.extend(other.warnings);
    }
}

/// State for one scan unit: the log span, the batch being filled and the
/// report of what was skipped.
#[derive(Debug)]
pub struct ScanContext {
    span: Span,
    pub batch: Batch,
    pub report: RunReport,
}

impl ScanContext {
    pub fn new(span: Span) -> Self {
        Self {
            span,
            batch: Batch::new(),
            report: RunReport::new(),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Add a record read from `path`.
    pub fn push_record(&mut self, record: PersonRecord, path: &Path) {
        self.batch.push(record.with_source_path(path));
        self.report.records_extracted += 1;
    }

    /// Split into the collected batch and report.
    pub fn finish(self) -> (Batch, RunReport) {
        (self.batch, self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persondup_core::WarningKind;

    #[test]
    fn test_report_counts_skips() {
        let mut report = RunReport::new();
        report.record_skip(&SkipReason::NoGeneralData);
        report.record_skip(&SkipReason::MissingNames);
        report.record_skip(&SkipReason::NotAScalar {
            field: "nombre".to_string(),
            found: "array",
        });
        report.record_skip(&SkipReason::NoGeneralData);

        assert_eq!(report.records_without_data, 2);
        assert_eq!(report.records_without_names, 1);
        assert_eq!(report.records_malformed, 1);
        assert_eq!(report.records_skipped(), 4);
    }

    #[test]
    fn test_report_merge() {
        let mut total = RunReport::new();
        let mut part = RunReport::new();
        part.files_seen = 3;
        part.files_processed = 2;
        part.files_failed = 1;
        part.records_extracted = 5;
        part.record_warning(ScanWarning::new("/a.json", "bad", WarningKind::ParseError));

        total.merge(part.clone());
        total.merge(part);

        assert_eq!(total.files_seen, 6);
        assert_eq!(total.files_failed, 2);
        assert_eq!(total.records_extracted, 10);
        assert_eq!(total.warnings.len(), 2);
    }

    #[test]
    fn test_context_attaches_source_path() {
        let mut ctx = ScanContext::new(Span::none());
        ctx.push_record(PersonRecord::new("Ana", "Lopez", "Garcia"), Path::new("/d/a.json"));

        let (batch, report) = ctx.finish();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.records[0].source_path, Path::new("/d/a.json"));
        assert_eq!(report.records_extracted, 1);
    }
}
