//! Error and warning types for scanning and extraction.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while scanning a source tree.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// File content is not valid JSON (or not UTF-8).
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// File parsed but its top-level value cannot hold records.
    #[error("Unexpected document in {path}: {source}")]
    Document {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    /// Partitioned scan found no child directories under the root.
    #[error("No subdirectories found in {path}")]
    NoPartitions { path: PathBuf },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Warning kind to record when this error is recovered from.
    pub fn warning_kind(&self) -> WarningKind {
        match self {
            Self::Json { .. } | Self::Document { .. } => WarningKind::ParseError,
            _ => WarningKind::ReadError,
        }
    }
}

/// A parsed document whose shape cannot carry records at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    #[error("expected an object or an array of objects, found {found}")]
    UnexpectedRoot { found: &'static str },
}

/// Why one element of a document produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// The declaration / general data path is absent or empty.
    #[error("no general data section")]
    NoGeneralData,

    /// The name guard rejected the record.
    #[error("first name or first surname is empty")]
    MissingNames,

    /// A node on the navigation path is not an object.
    #[error("expected an object at `{field}`, found {found}")]
    NotAnObject { field: String, found: &'static str },

    /// A leaf field holds an object or array.
    #[error("expected a scalar at `{field}`, found {found}")]
    NotAScalar { field: String, found: &'static str },
}

impl SkipReason {
    /// Whether the element had an unexpected shape (as opposed to simply
    /// not describing a person).
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::NotAnObject { .. } | Self::NotAScalar { .. })
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// File could not be read.
    ReadError,
    /// File could not be parsed as a record document.
    ParseError,
    /// Directory could not be listed.
    ListError,
    /// A record inside a valid file had an unexpected shape.
    MalformedRecord,
}

/// Non-fatal warning encountered during a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Create a warning for a file that was skipped because of `error`.
    pub fn from_error(path: impl Into<PathBuf>, error: &ScanError) -> Self {
        Self::new(path, error.to_string(), error.warning_kind())
    }

    /// Create a warning for a directory that could not be listed.
    pub fn list_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        Self {
            message: format!("Cannot list {}: {error}", path.display()),
            path,
            kind: WarningKind::ListError,
        }
    }

    /// Create a warning for a malformed record at `index` within a file.
    pub fn malformed_record(path: impl Into<PathBuf>, index: usize, reason: &SkipReason) -> Self {
        Self {
            path: path.into(),
            message: format!("Record {index}: {reason}"),
            kind: WarningKind::MalformedRecord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_io() {
        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::PermissionDenied { .. }));

        let err = ScanError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(err, ScanError::NotFound { .. }));
        assert_eq!(err.warning_kind(), WarningKind::ReadError);
    }

    #[test]
    fn test_parse_errors_map_to_parse_warnings() {
        let source = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = ScanError::Json {
            path: "/data/a.json".into(),
            source,
        };
        let warning = ScanWarning::from_error("/data/a.json", &err);
        assert_eq!(warning.kind, WarningKind::ParseError);
        assert!(warning.message.contains("/data/a.json"));
    }

    #[test]
    fn test_skip_reason_classification() {
        assert!(!SkipReason::NoGeneralData.is_malformed());
        assert!(!SkipReason::MissingNames.is_malformed());
        let reason = SkipReason::NotAnObject {
            field: "declaracion".to_string(),
            found: "string",
        };
        assert!(reason.is_malformed());
        assert_eq!(
            reason.to_string(),
            "expected an object at `declaracion`, found string"
        );

        let warning = ScanWarning::malformed_record("/data/a.json", 2, &reason);
        assert_eq!(warning.kind, WarningKind::MalformedRecord);
        assert!(warning.message.starts_with("Record 2:"));
    }
}
