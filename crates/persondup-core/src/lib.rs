//! Core types and record extraction for persondup.
//!
//! This crate provides the data structures shared by the rest of the
//! workspace: person records and their identity keys, the JSON record
//! schema, scan configuration, error types, and the [`Extractor`] that turns
//! one parsed JSON document into person records.
//!
//! ```rust
//! use persondup_core::{ExtractConfig, Extracted, Extractor};
//! use serde_json::json;
//!
//! let document = json!({
//!     "id": "abc",
//!     "declaracion": {
//!         "situacionPatrimonial": {
//!             "datosGenerales": {
//!                 "nombre": "Ana",
//!                 "primerApellido": "Lopez",
//!                 "segundoApellido": "Garcia"
//!             }
//!         }
//!     }
//! });
//!
//! let extractor = Extractor::new(ExtractConfig::whole_tree());
//! let outcomes = extractor.extract_document(&document).unwrap();
//! assert!(matches!(outcomes[0], Extracted::Record(_)));
//! ```

mod config;
mod error;
mod extract;
mod record;

pub use config::{
    ExtractConfig, ExtractConfigBuilder, NamePolicy, RecordSchema, ScanConfig, ScanConfigBuilder,
    ScanMode,
};
pub use error::{DocumentError, ScanError, ScanWarning, SkipReason, WarningKind};
pub use extract::{Extracted, Extractor, json_kind};
pub use record::{
    IdentityKey, MISSING_DATE, MISSING_ID, MISSING_INSTITUTION, MISSING_TYPE, PersonRecord,
};
