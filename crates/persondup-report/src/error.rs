//! Error types for report writing.

use std::io;
use std::path::PathBuf;

use persondup_core::ScanError;
use thiserror::Error;

/// Errors that can occur while producing reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Workbook could not be built or saved.
    #[error("Cannot write workbook {path}: {source}")]
    Xlsx {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },

    /// Delimited output could not be written.
    #[error("Cannot write CSV file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The output destination does not accept writes and no fallback is allowed.
    #[error("Destination is not writable: {path} ({reason})")]
    DestinationUnwritable { path: PathBuf, reason: String },

    /// The scan itself failed before any report could be produced.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

impl ReportError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the run must stop rather than skip the affected table.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DestinationUnwritable { .. } | Self::Scan(_))
    }

    /// Classify a failure to create or replace an output file.
    ///
    /// Failures that no retry can fix (permissions, a read-only mount, a
    /// regular file where a directory is needed) become
    /// [`DestinationUnwritable`](Self::DestinationUnwritable).
    pub fn output(path: impl Into<PathBuf>, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::PermissionDenied
            | io::ErrorKind::ReadOnlyFilesystem
            | io::ErrorKind::NotADirectory
            | io::ErrorKind::AlreadyExists
            | io::ErrorKind::IsADirectory => Self::DestinationUnwritable {
                path: path.into(),
                reason: source.to_string(),
            },
            _ => Self::io(path, source),
        }
    }
}
