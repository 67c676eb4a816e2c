//! Per-directory summary statistics for partitioned runs.

use serde::{Deserialize, Serialize};

use crate::duplicates::DuplicateReport;

/// Summary of one scanned directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySummary {
    /// Directory name.
    pub directory: String,
    /// JSON files parsed.
    pub files: u64,
    /// Person records extracted.
    pub records: usize,
    /// Rows in the directory's duplicate table.
    pub duplicate_rows: usize,
    /// Distinct identities occurring more than once.
    pub duplicate_identities: usize,
}

impl DirectorySummary {
    /// Summarize a directory from its analysis report.
    pub fn new(directory: impl Into<String>, files: u64, report: &DuplicateReport) -> Self {
        Self {
            directory: directory.into(),
            files,
            records: report.records_analyzed,
            duplicate_rows: report.row_count(),
            duplicate_identities: report.duplicate_identities,
        }
    }

    /// Summary for a directory that yielded no records.
    pub fn empty(directory: impl Into<String>, files: u64) -> Self {
        Self {
            directory: directory.into(),
            files,
            records: 0,
            duplicate_rows: 0,
            duplicate_identities: 0,
        }
    }
}

/// Sort summaries by duplicate rows, descending. Ties keep scan order.
pub fn sort_summaries(summaries: &mut [DirectorySummary]) {
    summaries.sort_by(|a, b| b.duplicate_rows.cmp(&a.duplicate_rows));
}

/// Run-wide totals over all directories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    /// Directories that contained at least one parsed file.
    pub directories: usize,
    pub files: u64,
    pub records: usize,
    pub duplicate_rows: usize,
}

impl RunTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one directory's summary.
    pub fn record(&mut self, summary: &DirectorySummary) {
        if summary.files > 0 {
            self.directories += 1;
        }
        self.files += summary.files;
        self.records += summary.records;
        self.duplicate_rows += summary.duplicate_rows;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_is_stable_descending() {
        let mut summaries = vec![
            DirectorySummary {
                duplicate_rows: 2,
                ..DirectorySummary::empty("a", 1)
            },
            DirectorySummary {
                duplicate_rows: 5,
                ..DirectorySummary::empty("b", 1)
            },
            DirectorySummary {
                duplicate_rows: 2,
                ..DirectorySummary::empty("c", 1)
            },
        ];

        sort_summaries(&mut summaries);
        let names: Vec<&str> = summaries.iter().map(|s| s.directory.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_totals_skip_empty_directories() {
        let mut totals = RunTotals::new();
        totals.record(&DirectorySummary::empty("none", 0));
        totals.record(&DirectorySummary {
            records: 4,
            duplicate_rows: 2,
            duplicate_identities: 1,
            ..DirectorySummary::empty("some", 3)
        });

        assert_eq!(totals.directories, 1);
        assert_eq!(totals.files, 3);
        assert_eq!(totals.records, 4);
        assert_eq!(totals.duplicate_rows, 2);
    }
}
