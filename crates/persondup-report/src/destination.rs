//! Output location resolution and writability checks.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ReportError;

/// Workbook file name used when a whole-tree destination is a directory.
pub const TREE_WORKBOOK_NAME: &str = "duplicates.xlsx";

/// File-name timestamp, e.g. `20240201_134502`.
pub fn timestamp(at: DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Timestamp for the current local time.
pub fn timestamp_now() -> String {
    timestamp(Local::now())
}

/// How a workbook file name is chosen when the destination is a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkbookName {
    /// Always `duplicates.xlsx`.
    Fixed,
    /// `duplicates_<timestamp>.xlsx`.
    Timestamped(String),
}

/// Resolve the workbook path for a destination argument.
///
/// An existing directory gets a file name appended; anything else is used
/// as the file path itself.
pub fn resolve_workbook_path(destination: &Path, name: &WorkbookName) -> PathBuf {
    if !destination.is_dir() {
        return destination.to_path_buf();
    }
    match name {
        WorkbookName::Fixed => destination.join(TREE_WORKBOOK_NAME),
        WorkbookName::Timestamped(stamp) => destination.join(format!("duplicates_{stamp}.xlsx")),
    }
}

/// Create the parent directory of an output file.
///
/// A parent that cannot be created is reported as
/// [`ReportError::DestinationUnwritable`].
pub fn ensure_parent(path: &Path) -> Result<(), ReportError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| ReportError::output(parent, e))
        }
        _ => Ok(()),
    }
}

/// Check that files can be created in `dir` by creating and removing one.
pub fn probe_writable(dir: &Path) -> Result<(), ReportError> {
    let probe = tempfile::Builder::new()
        .prefix(".persondup-probe-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| ReportError::DestinationUnwritable {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

    debug!(probe = %probe.path().display(), "Destination is writable");
    probe.close().map_err(|e| ReportError::io(dir, e))
}

/// The process temp directory.
pub fn temp_dir() -> PathBuf {
    env::temp_dir()
}

/// What to do when the CSV destination cannot be written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackPolicy {
    /// Write to the process temp directory instead.
    #[default]
    TempDir,
    /// Fail the run.
    Fail,
}

/// Configuration for the CSV sink.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct CsvSinkConfig {
    /// Directory the CSV files go to.
    pub destination: PathBuf,

    #[builder(default)]
    pub fallback: FallbackPolicy,

    /// Write straight to the temp directory without trying the destination.
    #[builder(default = "false")]
    pub force_temp: bool,

    /// Timestamp for the summary file name.
    #[builder(default = "timestamp_now()")]
    pub timestamp: String,
}

impl CsvSinkConfig {
    /// Create a config with default fallback behaviour.
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            fallback: FallbackPolicy::default(),
            force_temp: false,
            timestamp: timestamp_now(),
        }
    }

    /// Create a new config builder.
    pub fn builder() -> CsvSinkConfigBuilder {
        CsvSinkConfigBuilder::default()
    }
}

/// Where CSV files will actually be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDirectory {
    pub path: PathBuf,
    /// True when the destination was abandoned for the temp directory.
    pub fell_back: bool,
}

/// Pick the output directory for a CSV run.
///
/// Creates the destination when missing and probes it for writes. On failure
/// the policy decides between the temp directory and an error.
pub fn resolve_csv_directory(config: &CsvSinkConfig) -> Result<ResolvedDirectory, ReportError> {
    if config.force_temp {
        return Ok(ResolvedDirectory {
            path: temp_dir(),
            fell_back: false,
        });
    }

    let destination = &config.destination;
    let checked = fs::create_dir_all(destination)
        .map_err(|e| ReportError::DestinationUnwritable {
            path: destination.clone(),
            reason: e.to_string(),
        })
        .and_then(|()| probe_writable(destination));

    match (checked, config.fallback) {
        (Ok(()), _) => Ok(ResolvedDirectory {
            path: destination.clone(),
            fell_back: false,
        }),
        (Err(err), FallbackPolicy::TempDir) => {
            let fallback = temp_dir();
            warn!(
                error = %err,
                "Cannot write to {}, using {} instead",
                destination.display(),
                fallback.display()
            );
            Ok(ResolvedDirectory {
                path: fallback,
                fell_back: true,
            })
        }
        (Err(ReportError::Io { path, source }), FallbackPolicy::Fail) => {
            Err(ReportError::DestinationUnwritable {
                path,
                reason: source.to_string(),
            })
        }
        (Err(err), FallbackPolicy::Fail) => Err(err),
    }
}
