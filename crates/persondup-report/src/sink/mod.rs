//! Destinations for report tables.

mod delimited;
mod xlsx;

use std::path::PathBuf;

use serde::Serialize;

use crate::error::ReportError;
use crate::table::Table;

pub use delimited::CsvSink;
pub use xlsx::XlsxSink;

/// Result of handing one table to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The table was written, or staged for the final save, at `path`.
    Written { path: PathBuf, fell_back: bool },
    /// The table was dropped; the run continues.
    Skipped { reason: String },
}

/// What a sink produced once finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SinkOutput {
    /// Files written, in write order.
    pub files: Vec<PathBuf>,
    /// Directory or workbook the files went to.
    pub location: Option<PathBuf>,
    /// True when any file went to the temp directory instead of the destination.
    pub fell_back: bool,
}

/// A writer of report tables.
pub trait TableSink {
    /// Write or stage one table.
    fn write_table(&mut self, table: &Table) -> Result<WriteOutcome, ReportError>;

    /// Flush everything to disk.
    fn finish(self) -> Result<SinkOutput, ReportError>
    where
        Self: Sized;
}
