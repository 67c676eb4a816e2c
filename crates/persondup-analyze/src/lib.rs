//! Duplicate analysis for persondup.
//!
//! - **Duplicate detection** - group person records by exact identity
//!   (first name, first surname, second surname) and keep the identities
//!   that appear more than once
//! - **Directory summaries** - per-directory and run-wide statistics for
//!   partitioned scans
//!
//! ```rust
//! use persondup_analyze::DuplicateAnalyzer;
//! use persondup_core::PersonRecord;
//!
//! let batch = vec![
//!     PersonRecord::new("Ana", "Lopez", "Garcia"),
//!     PersonRecord::new("Ana", "Lopez", "Garcia"),
//!     PersonRecord::new("Bob", "Diaz", ""),
//! ];
//!
//! let report = DuplicateAnalyzer::new().analyze(&batch);
//! assert_eq!(report.duplicate_identities, 1);
//! assert_eq!(report.row_count(), 2);
//! ```

mod duplicates;
pub mod summary;

pub use duplicates::{
    AnalyzeConfig, AnalyzeConfigBuilder, DuplicateAnalyzer, DuplicateGroup, DuplicateReport,
    DuplicateRow,
};
pub use summary::{DirectorySummary, RunTotals, sort_summaries};

// Re-export core types
pub use persondup_core::{IdentityKey, PersonRecord};
