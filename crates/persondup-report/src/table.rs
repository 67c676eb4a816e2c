//! Format-neutral report tables.
//!
//! A [`Table`] is a named header row plus data rows of [`Cell`]s. Sinks decide
//! how a table becomes a worksheet or a file.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use persondup_analyze::{DirectorySummary, DuplicateReport, DuplicateRow, sort_summaries};
use persondup_core::MISSING_TYPE;

/// Sheet name used for the whole-tree duplicate table.
pub const DUPLICATES_SHEET: &str = "Duplicate Records";
/// Sheet name used for the per-directory summary table.
pub const SUMMARY_SHEET: &str = "Summary";
/// Longest worksheet name a workbook accepts.
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// One table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Count(u64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Count(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::Count(value as u64)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Cell::Count(value)
    }
}

/// What a table holds. Sinks use it to pick file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TableKind {
    Duplicates,
    Summary,
}

/// A named table ready to be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Directory name, or one of the fixed sheet names.
    pub name: String,
    pub kind: TableKind,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(name: impl Into<String>, kind: TableKind, headers: Vec<&'static str>) -> Self {
        Self {
            name: name.into(),
            kind,
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.headers.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Optional columns of a duplicate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Columns {
    pub full_name: bool,
    pub occurrence_number: bool,
    pub declaration_type: bool,
}

impl Columns {
    /// Whole-tree layout: occurrence numbers, no full name or declaration type.
    pub fn whole_tree() -> Self {
        Self {
            full_name: false,
            occurrence_number: true,
            declaration_type: false,
        }
    }

    /// Per-directory layout: full name and declaration type, no occurrence numbers.
    pub fn partitioned() -> Self {
        Self {
            full_name: true,
            occurrence_number: false,
            declaration_type: true,
        }
    }

    pub fn headers(&self) -> Vec<&'static str> {
        let mut headers = vec!["firstName", "firstSurname", "secondSurname"];
        if self.full_name {
            headers.push("fullName");
        }
        headers.push("occurrenceCount");
        if self.occurrence_number {
            headers.push("occurrenceNumber");
        }
        headers.extend(["id", "institution", "lastUpdated"]);
        if self.declaration_type {
            headers.push("declarationType");
        }
        headers.push("sourcePath");
        headers
    }

    fn row(&self, row: &DuplicateRow) -> Vec<Cell> {
        let record = &row.record;
        let mut cells: Vec<Cell> = vec![
            record.first_name.as_str().into(),
            record.first_surname.as_str().into(),
            record.second_surname.as_str().into(),
        ];
        if self.full_name {
            cells.push(record.full_name.as_str().into());
        }
        cells.push(row.occurrence_count.into());
        if self.occurrence_number {
            cells.push(row.occurrence_number.into());
        }
        cells.extend([
            record.id.as_str().into(),
            record.institution.as_str().into(),
            record.last_updated.as_str().into(),
        ]);
        if self.declaration_type {
            cells.push(record.declaration_type.as_deref().unwrap_or(MISSING_TYPE).into());
        }
        cells.push(record.source_path.display().to_string().into());
        cells
    }
}

/// Build the duplicate table for one report, keeping the report's row order.
pub fn duplicates_table(
    name: impl Into<String>,
    report: &DuplicateReport,
    columns: Columns,
) -> Table {
    let mut table = Table::new(name, TableKind::Duplicates, columns.headers());
    for row in &report.rows {
        table.push_row(columns.row(row));
    }
    table
}

/// Build the summary table, ordered by duplicate rows descending.
pub fn summary_table(summaries: &[DirectorySummary]) -> Table {
    let mut sorted = summaries.to_vec();
    sort_summaries(&mut sorted);

    let mut table = Table::new(
        SUMMARY_SHEET,
        TableKind::Summary,
        vec![
            "directory",
            "files",
            "records",
            "duplicateRows",
            "duplicateIdentities",
        ],
    );
    for summary in sorted {
        table.push_row(vec![
            summary.directory.into(),
            summary.files.into(),
            summary.records.into(),
            summary.duplicate_rows.into(),
            summary.duplicate_identities.into(),
        ]);
    }
    table
}

/// Worksheet name for a directory: the first 31 characters.
pub fn sheet_name(directory: &str) -> String {
    directory.chars().take(MAX_SHEET_NAME_CHARS).collect()
}

/// File-name-safe form of a directory name.
pub fn sanitize_file_stem(directory: &str) -> String {
    directory.replace(['/', '\\', ' '], "_")
}
