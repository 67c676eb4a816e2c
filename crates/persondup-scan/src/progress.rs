//! Scan progress reporting.

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Progress information during a scan.
#[derive(Debug, Clone)]
pub struct ScanProgress {
    /// JSON files visited so far.
    pub files_seen: u64,
    /// Files in the current unit (whole tree or one directory), when known.
    pub files_total: Option<u64>,
    /// Records extracted so far.
    pub records_extracted: u64,
    /// File being processed.
    pub current_path: PathBuf,
    /// Number of warnings encountered.
    pub warnings_count: u64,
    /// Time elapsed since the scan started.
    pub elapsed: Duration,
}

impl ScanProgress {
    /// Create initial progress state.
    pub fn new() -> Self {
        Self {
            files_seen: 0,
            files_total: None,
            records_extracted: 0,
            current_path: PathBuf::new(),
            warnings_count: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Calculate scan rate in files per second.
    pub fn files_per_second(&self) -> f64 {
        if self.elapsed.as_secs_f64() > 0.0 {
            self.files_seen as f64 / self.elapsed.as_secs_f64()
        } else {
            0.0
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Progress tracker with timing, owned by one scan unit.
#[derive(Debug)]
pub(crate) struct ProgressTracker {
    start_time: Instant,
    every: u64,
    files_total: Option<u64>,
}

impl ProgressTracker {
    pub fn new(every: u64, files_total: Option<u64>) -> Self {
        Self {
            start_time: Instant::now(),
            every: every.max(1),
            files_total,
        }
    }

    /// Whether a progress update is due after `files_seen` files.
    pub fn is_due(&self, files_seen: u64) -> bool {
        files_seen > 0 && files_seen % self.every == 0
    }

    pub fn snapshot(
        &self,
        files_seen: u64,
        records_extracted: u64,
        warnings_count: u64,
        current_path: PathBuf,
    ) -> ScanProgress {
        ScanProgress {
            files_seen,
            files_total: self.files_total,
            records_extracted,
            current_path,
            warnings_count,
            elapsed: self.start_time.elapsed(),
        }
    }
}
