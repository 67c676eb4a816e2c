//! Report output for persondup.
//!
//! Duplicate and summary results are turned into format-neutral [`Table`]s,
//! which a [`TableSink`] writes out:
//!
//! - [`XlsxSink`] stages one worksheet per table and saves a single workbook.
//! - [`CsvSink`] writes one CSV file per table, falling back to the temp
//!   directory when the destination refuses writes.
//!
//! [`run_whole_tree`] and [`run_partitioned`] tie scanning, analysis and
//! writing together.
//!
//! ```rust,no_run
//! use persondup_analyze::AnalyzeConfig;
//! use persondup_report::{CsvSink, CsvSinkConfig, run_partitioned};
//! use persondup_scan::{ScanConfig, TreeWalker};
//!
//! let sink = CsvSink::prepare(CsvSinkConfig::new("/srv/reports")).unwrap();
//! let outcome = run_partitioned(
//!     &TreeWalker::new(),
//!     &ScanConfig::partitioned("/data/declarations"),
//!     AnalyzeConfig::default(),
//!     sink,
//! )
//! .unwrap();
//!
//! for summary in &outcome.summaries {
//!     println!("{}: {} duplicate rows", summary.directory, summary.duplicate_rows);
//! }
//! ```

pub mod destination;
mod error;
mod pipeline;
mod sink;
pub mod table;

pub use destination::{
    CsvSinkConfig, CsvSinkConfigBuilder, FallbackPolicy, WorkbookName, probe_writable,
    resolve_workbook_path, timestamp, timestamp_now,
};
pub use error::ReportError;
pub use pipeline::{PartitionedOutcome, TreeOutcome, run_partitioned, run_whole_tree};
pub use sink::{CsvSink, SinkOutput, TableSink, WriteOutcome, XlsxSink};
pub use table::{
    Cell, Columns, Table, TableKind, duplicates_table, sanitize_file_stem, sheet_name,
    summary_table,
};
