use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use tracing::{debug, info, warn};

use crate::destination::ensure_parent;
use crate::error::ReportError;
use crate::table::{Cell, SUMMARY_SHEET, Table, TableKind, sheet_name};

use super::{SinkOutput, TableSink, WriteOutcome};

/// Collects tables as worksheets of one workbook, saved on [`finish`](TableSink::finish).
pub struct XlsxSink {
    path: PathBuf,
    workbook: Workbook,
    header_format: Format,
    /// Lowercased names already used; sheet names are case-insensitive.
    used_names: HashSet<String>,
    /// Lowercased summary sheet name, never given to a directory table.
    summary_key: String,
    sheets: usize,
}

impl XlsxSink {
    /// Target `path`, creating its parent directories.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let path = path.into();
        ensure_parent(&path)?;

        Ok(Self {
            path,
            workbook: Workbook::new(),
            header_format: Format::new().set_bold(),
            used_names: HashSet::new(),
            summary_key: SUMMARY_SHEET.to_lowercase(),
            sheets: 0,
        })
    }

    /// Like [`create`](Self::create), removing any file already at `path`.
    pub fn create_replacing(path: impl Into<PathBuf>) -> Result<Self, ReportError> {
        let path = path.into();
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| ReportError::output(&path, e))?;
            info!("Removed previous report {}", path.display());
        }
        Self::create(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of worksheets staged so far.
    pub fn sheet_count(&self) -> usize {
        self.sheets
    }

    fn build_sheet(&self, name: &str, table: &Table) -> Result<Worksheet, XlsxError> {
        let mut sheet = Worksheet::new();
        sheet.set_name(name)?;

        for (col, header) in table.headers.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, *header, &self.header_format)?;
        }
        for (i, row) in table.rows.iter().enumerate() {
            let row_num = (i + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(text) => sheet.write_string(row_num, col as u16, text)?,
                    Cell::Count(n) => sheet.write_number(row_num, col as u16, *n as f64)?,
                };
            }
        }
        sheet.autofit();

        Ok(sheet)
    }
}

impl TableSink for XlsxSink {
    fn write_table(&mut self, table: &Table) -> Result<WriteOutcome, ReportError> {
        let name = sheet_name(&table.name);
        let key = name.to_lowercase();

        let reserved = table.kind == TableKind::Duplicates && key == self.summary_key;
        if reserved || self.used_names.contains(&key) {
            let reason = if reserved {
                format!("sheet name '{name}' is reserved for the summary")
            } else {
                format!("sheet name '{name}' already used")
            };
            warn!(directory = %table.name, %reason, "Skipping table");
            return Ok(WriteOutcome::Skipped { reason });
        }

        let sheet = match self.build_sheet(&name, table) {
            Ok(sheet) => sheet,
            Err(err) => {
                warn!(
                    directory = %table.name,
                    error = %err,
                    "Cannot build worksheet, skipping table"
                );
                return Ok(WriteOutcome::Skipped {
                    reason: err.to_string(),
                });
            }
        };

        self.workbook.push_worksheet(sheet);
        self.used_names.insert(key);
        self.sheets += 1;
        debug!(sheet = %name, rows = table.row_count(), "Staged worksheet");

        Ok(WriteOutcome::Written {
            path: self.path.clone(),
            fell_back: false,
        })
    }

    fn finish(mut self) -> Result<SinkOutput, ReportError> {
        if self.sheets == 0 {
            debug!("No worksheets staged, nothing to save");
            return Ok(SinkOutput::default());
        }

        self.workbook
            .save(&self.path)
            .map_err(|source| match source {
                XlsxError::IoError(io) => ReportError::output(&self.path, io),
                source => ReportError::Xlsx {
                    path: self.path.clone(),
                    source,
                },
            })?;
        info!(sheets = self.sheets, "Saved workbook {}", self.path.display());

        Ok(SinkOutput {
            files: vec![self.path.clone()],
            location: Some(self.path),
            fell_back: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table(name: &str) -> Table {
        let headers = vec!["firstName", "occurrenceCount"];
        let mut table = Table::new(name, TableKind::Duplicates, headers);
        table.push_row(vec![Cell::from("Ana"), Cell::Count(2)]);
        table.push_row(vec![Cell::from("Ana"), Cell::Count(2)]);
        table
    }

    #[test]
    fn test_colliding_sheet_names_are_skipped() {
        let temp = TempDir::new().unwrap();
        let mut sink = XlsxSink::create(temp.path().join("out.xlsx")).unwrap();

        let prefix = "A".repeat(31);
        let first = sink.write_table(&table(&format!("{prefix}1"))).unwrap();
        let second = sink.write_table(&table(&format!("{prefix}2"))).unwrap();

        assert!(matches!(first, WriteOutcome::Written { .. }));
        assert!(matches!(second, WriteOutcome::Skipped { .. }));
        assert_eq!(sink.sheet_count(), 1);
    }

    #[test]
    fn test_directory_named_summary_does_not_take_summary_sheet() {
        let temp = TempDir::new().unwrap();
        let mut sink = XlsxSink::create(temp.path().join("out.xlsx")).unwrap();

        let directory = sink.write_table(&table("summary")).unwrap();
        let summary = Table::new(SUMMARY_SHEET, TableKind::Summary, vec!["directory"]);
        let written = sink.write_table(&summary).unwrap();

        assert!(matches!(directory, WriteOutcome::Skipped { .. }));
        assert!(matches!(written, WriteOutcome::Written { .. }));
        assert_eq!(sink.sheet_count(), 1);
    }

    #[test]
    fn test_invalid_sheet_name_is_skipped() {
        let temp = TempDir::new().unwrap();
        let mut sink = XlsxSink::create(temp.path().join("out.xlsx")).unwrap();

        let outcome = sink.write_table(&table("a[b]")).unwrap();
        assert!(matches!(outcome, WriteOutcome::Skipped { .. }));
        assert_eq!(sink.sheet_count(), 0);
    }

    #[test]
    fn test_finish_saves_workbook() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/out.xlsx");
        let mut sink = XlsxSink::create(&path).unwrap();
        sink.write_table(&table("SALUD")).unwrap();

        let output = sink.finish().unwrap();
        assert_eq!(output.files, vec![path.clone()]);
        assert!(path.is_file());
    }

    #[test]
    fn test_finish_without_sheets_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.xlsx");

        let output = XlsxSink::create(&path).unwrap().finish().unwrap();
        assert!(output.files.is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_create_replacing_removes_old_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.xlsx");
        fs::write(&path, "stale").unwrap();

        let _sink = XlsxSink::create_replacing(&path).unwrap();
        assert!(!path.exists());
    }
}
