//! Person records and identity keys.

use std::fmt;
use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Placeholder used when a record carries no `id`.
pub const MISSING_ID: &str = "No ID";
/// Placeholder used when the metadata has no institution.
pub const MISSING_INSTITUTION: &str = "No institution";
/// Placeholder used when the metadata has no update date.
pub const MISSING_DATE: &str = "No date";
/// Placeholder used when the metadata has no declaration type.
pub const MISSING_TYPE: &str = "No type";

/// The exact-match identity of a person: first name plus both surnames.
///
/// Comparison is byte-for-byte. No case folding, trimming or accent
/// normalization is applied, so spelling variants are distinct identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    pub first_name: CompactString,
    pub first_surname: CompactString,
    pub second_surname: CompactString,
}

impl IdentityKey {
    /// Create a new identity key.
    pub fn new(
        first_name: impl Into<CompactString>,
        first_surname: impl Into<CompactString>,
        second_surname: impl Into<CompactString>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            first_surname: first_surname.into(),
            second_surname: second_surname.into(),
        }
    }

    /// The `first|first_surname|second_surname` form of the key.
    pub fn joined(&self) -> String {
        format!(
            "{}|{}|{}",
            self.first_name, self.first_surname, self.second_surname
        )
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

/// One normalized extraction of a person from a declaration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    /// Record id, or [`MISSING_ID`].
    pub id: String,
    pub first_name: CompactString,
    pub first_surname: CompactString,
    pub second_surname: CompactString,
    /// Space-joined name parts. Empty parts leave their separators in place.
    pub full_name: String,
    /// Declaring institution, or [`MISSING_INSTITUTION`].
    pub institution: String,
    /// Opaque update date string, or [`MISSING_DATE`].
    pub last_updated: String,
    /// Declaration type, only captured when the extraction asks for it.
    pub declaration_type: Option<String>,
    /// File the record was read from. Empty until the walker attaches it.
    pub source_path: PathBuf,
}

impl PersonRecord {
    /// Create a record from its name parts, with every other field defaulted.
    pub fn new(
        first_name: impl Into<CompactString>,
        first_surname: impl Into<CompactString>,
        second_surname: impl Into<CompactString>,
    ) -> Self {
        let first_name = first_name.into();
        let first_surname = first_surname.into();
        let second_surname = second_surname.into();
        let full_name = format!("{first_name} {first_surname} {second_surname}");

        Self {
            id: MISSING_ID.to_string(),
            first_name,
            first_surname,
            second_surname,
            full_name,
            institution: MISSING_INSTITUTION.to_string(),
            last_updated: MISSING_DATE.to_string(),
            declaration_type: None,
            source_path: PathBuf::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_institution(mut self, institution: impl Into<String>) -> Self {
        self.institution = institution.into();
        self
    }

    pub fn with_last_updated(mut self, last_updated: impl Into<String>) -> Self {
        self.last_updated = last_updated.into();
        self
    }

    pub fn with_declaration_type(mut self, declaration_type: impl Into<String>) -> Self {
        self.declaration_type = Some(declaration_type.into());
        self
    }

    /// Attach the originating file path.
    pub fn with_source_path(mut self, path: impl AsRef<Path>) -> Self {
        self.source_path = path.as_ref().to_path_buf();
        self
    }

    /// Build the identity key of this record.
    pub fn identity(&self) -> IdentityKey {
        IdentityKey {
            first_name: self.first_name.clone(),
            first_surname: self.first_surname.clone(),
            second_surname: self.second_surname.clone(),
        }
    }

    /// Check whether two records share an identity without allocating a key.
    pub fn same_identity(&self, other: &PersonRecord) -> bool {
        self.first_name == other.first_name
            && self.first_surname == other.first_surname
            && self.second_surname == other.second_surname
    }

    /// Whether both the first name and the first surname are non-empty.
    pub fn has_required_names(&self) -> bool {
        !self.first_name.is_empty() && !self.first_surname.is_empty()
    }
}
