//! Directory walking for persondup.
//!
//! This crate finds JSON declaration files and runs them through the
//! [`Extractor`](persondup_core::Extractor), collecting person records into
//! batches:
//!
//! - **Whole-tree mode** walks every directory below the root (jwalk, serial,
//!   sorted) and produces one batch.
//! - **Partitioned mode** lists the immediate child directories of the root
//!   and produces one batch per directory from the `.json` files directly
//!   inside it.
//!
//! Unreadable files, malformed documents and malformed records are logged,
//! counted in a [`RunReport`] and skipped; they never abort the walk.
//!
//! # Example
//!
//! ```rust,no_run
//! use persondup_scan::{ScanConfig, TreeWalker};
//!
//! let walker = TreeWalker::new();
//! let scan = walker.walk_tree(&ScanConfig::new("/data/declarations")).unwrap();
//!
//! println!("{} records from {} files", scan.batch.len(), scan.report.files_processed);
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use persondup_scan::{ScanConfig, TreeWalker};
//!
//! let walker = TreeWalker::new();
//! let mut progress_rx = walker.subscribe();
//! let config = ScanConfig::partitioned("/data/declarations");
//!
//! for partition in walker.list_partitions(&config).unwrap() {
//!     let scan = walker.scan_partition(&partition, &config);
//!     while let Ok(progress) = progress_rx.try_recv() {
//!         println!("{}: {} files", partition.name, progress.files_seen);
//!     }
//!     println!("{}: {} records", partition.name, scan.batch.len());
//! }
//! ```

mod context;
mod progress;
mod walker;

pub use context::{Batch, FileOutcome, RunReport, ScanContext};
pub use progress::ScanProgress;
pub use walker::{Partition, PartitionScan, TreeScan, TreeWalker, read_document};

// Re-export core types for convenience
pub use persondup_core::{
    ExtractConfig, Extractor, PersonRecord, ScanConfig, ScanError, ScanMode, ScanWarning,
    WarningKind,
};
