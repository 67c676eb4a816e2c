use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::destination::{
    CsvSinkConfig, FallbackPolicy, ResolvedDirectory, resolve_csv_directory, temp_dir,
};
use crate::error::ReportError;
use crate::table::{Table, TableKind, sanitize_file_stem};

use super::{SinkOutput, TableSink, WriteOutcome};

/// Writes each table to its own CSV file.
pub struct CsvSink {
    dir: PathBuf,
    fallback: FallbackPolicy,
    timestamp: String,
    fell_back: bool,
    files: Vec<PathBuf>,
}

impl CsvSink {
    /// Resolve and check the output directory.
    pub fn prepare(config: CsvSinkConfig) -> Result<Self, ReportError> {
        let ResolvedDirectory { path, fell_back } = resolve_csv_directory(&config)?;
        info!("Writing CSV reports to {}", path.display());

        Ok(Self {
            dir: path,
            fallback: config.fallback,
            timestamp: config.timestamp,
            fell_back,
            files: Vec::new(),
        })
    }

    /// Directory files are currently written to.
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    pub fn fell_back(&self) -> bool {
        self.fell_back
    }

    fn file_name(&self, table: &Table) -> String {
        match table.kind {
            TableKind::Duplicates => format!("duplicates_{}.csv", sanitize_file_stem(&table.name)),
            TableKind::Summary => format!("summary_duplicates_{}.csv", self.timestamp),
        }
    }

    fn write_to(path: &Path, table: &Table) -> Result<(), ReportError> {
        let file = File::create(path).map_err(|e| ReportError::io(path, e))?;
        let mut writer = ::csv::Writer::from_writer(file);
        let csv_err = |source| ReportError::Csv {
            path: path.to_path_buf(),
            source,
        };

        writer.write_record(&table.headers).map_err(csv_err)?;
        for row in &table.rows {
            writer
                .write_record(row.iter().map(|cell| cell.to_string()))
                .map_err(csv_err)?;
        }
        writer.flush().map_err(|e| ReportError::io(path, e))
    }
}

impl TableSink for CsvSink {
    fn write_table(&mut self, table: &Table) -> Result<WriteOutcome, ReportError> {
        let file_name = self.file_name(table);
        let path = self.dir.join(&file_name);

        match Self::write_to(&path, table) {
            Ok(()) => {
                info!(rows = table.row_count(), "Wrote {}", path.display());
                self.files.push(path.clone());
                Ok(WriteOutcome::Written {
                    path,
                    fell_back: false,
                })
            }
            Err(ReportError::Io { source, .. })
                if source.kind() == io::ErrorKind::PermissionDenied =>
            {
                let tmp = temp_dir();
                if self.fallback == FallbackPolicy::Fail || self.dir == tmp {
                    return Err(ReportError::DestinationUnwritable {
                        path,
                        reason: source.to_string(),
                    });
                }

                let retry = tmp.join(&file_name);
                warn!(
                    "Permission denied writing {}, retrying in {}",
                    path.display(),
                    tmp.display()
                );
                Self::write_to(&retry, table)?;
                info!(rows = table.row_count(), "Wrote {}", retry.display());

                self.fell_back = true;
                self.files.push(retry.clone());
                Ok(WriteOutcome::Written {
                    path: retry,
                    fell_back: true,
                })
            }
            Err(err) => Err(err),
        }
    }

    fn finish(self) -> Result<SinkOutput, ReportError> {
        Ok(SinkOutput {
            files: self.files,
            location: Some(self.dir),
            fell_back: self.fell_back,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use std::fs;
    use tempfile::TempDir;

    fn config(dest: &Path) -> CsvSinkConfig {
        CsvSinkConfig::builder()
            .destination(dest)
            .timestamp("20240201_134502")
            .build()
            .unwrap()
    }

    #[test]
    fn test_file_names() {
        let temp = TempDir::new().unwrap();
        let mut sink = CsvSink::prepare(config(temp.path())).unwrap();

        let mut dup = Table::new("SEC DE SALUD/IMSS", TableKind::Duplicates, vec!["firstName"]);
        dup.push_row(vec![Cell::from("Ana")]);
        let summary = Table::new("Summary", TableKind::Summary, vec!["directory"]);

        sink.write_table(&dup).unwrap();
        sink.write_table(&summary).unwrap();
        let output = sink.finish().unwrap();

        assert_eq!(
            output.files,
            vec![
                temp.path().join("duplicates_SEC_DE_SALUD_IMSS.csv"),
                temp.path().join("summary_duplicates_20240201_134502.csv"),
            ]
        );
        assert!(!output.fell_back);
    }

    #[test]
    fn test_cells_are_quoted_when_needed() {
        let temp = TempDir::new().unwrap();
        let mut sink = CsvSink::prepare(config(temp.path())).unwrap();

        let mut table = Table::new("x", TableKind::Duplicates, vec!["institution", "count"]);
        table.push_row(vec![Cell::from("SALUD, IMSS"), Cell::Count(3)]);
        sink.write_table(&table).unwrap();

        let content = fs::read_to_string(temp.path().join("duplicates_x.csv")).unwrap();
        assert_eq!(content, "institution,count\n\"SALUD, IMSS\",3\n");
    }
}
