//! Record extraction from parsed declaration documents.
//!
//! Every lookup into the document yields an explicit [`Lookup`]: a missing
//! navigation path means the element simply does not describe a person and
//! is skipped quietly, a missing leaf falls back to its default, and a node
//! of the wrong JSON type skips the element as malformed. The extractor is
//! path-agnostic; the walker attaches the source file afterwards.

use serde_json::{Map, Value};

use crate::config::{ExtractConfig, NamePolicy};
use crate::error::{DocumentError, SkipReason};
use crate::record::{MISSING_DATE, MISSING_ID, MISSING_INSTITUTION, MISSING_TYPE, PersonRecord};

/// Outcome of extracting one document element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Record(PersonRecord),
    Skipped(SkipReason),
}

impl Extracted {
    /// Get the record, if one was produced.
    pub fn into_record(self) -> Option<PersonRecord> {
        match self {
            Self::Record(record) => Some(record),
            Self::Skipped(_) => None,
        }
    }
}

/// Result of looking up a key in a JSON node.
enum Lookup<'a> {
    Present(&'a Value),
    Absent,
    /// The node being searched is not an object.
    WrongShape(&'static str),
}

fn lookup<'a>(node: &'a Value, key: &str) -> Lookup<'a> {
    match node {
        Value::Object(map) => match map.get(key) {
            Some(Value::Null) | None => Lookup::Absent,
            Some(value) => Lookup::Present(value),
        },
        other => Lookup::WrongShape(json_kind(other)),
    }
}

/// Name of a JSON value's type, for diagnostics.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read a scalar leaf. Strings are used verbatim, numbers and booleans are
/// rendered as JSON text.
fn leaf(map: &Map<String, Value>, key: &str) -> Result<Option<String>, SkipReason> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(value @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(value.to_string())),
        Some(other) => Err(SkipReason::NotAScalar {
            field: key.to_string(),
            found: json_kind(other),
        }),
    }
}

/// Turns declaration documents into person records.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    /// Create an extractor with the given settings.
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// Get the extraction settings.
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Extract every element of a document.
    ///
    /// A bare object is treated as a one-element array. Any other top-level
    /// value cannot hold records and is rejected as a whole.
    pub fn extract_document(&self, document: &Value) -> Result<Vec<Extracted>, DocumentError> {
        let elements = match document {
            Value::Array(items) => items.as_slice(),
            Value::Object(_) => std::slice::from_ref(document),
            other => {
                return Err(DocumentError::UnexpectedRoot {
                    found: json_kind(other),
                });
            }
        };

        Ok(elements.iter().map(|element| self.extract(element)).collect())
    }

    /// Extract a single document element.
    pub fn extract(&self, element: &Value) -> Extracted {
        match self.try_extract(element) {
            Ok(record) => Extracted::Record(record),
            Err(reason) => Extracted::Skipped(reason),
        }
    }

    fn try_extract(&self, element: &Value) -> Result<PersonRecord, SkipReason> {
        let schema = &self.config.schema;

        let element_map = element.as_object().ok_or_else(|| SkipReason::NotAnObject {
            field: "record".to_string(),
            found: json_kind(element),
        })?;

        let general = match self.general_data(element)? {
            Some(map) => map,
            None => return Err(SkipReason::NoGeneralData),
        };

        let first_name = leaf(general, &schema.first_name)?.unwrap_or_default();
        let first_surname = leaf(general, &schema.first_surname)?.unwrap_or_default();
        let second_surname = leaf(general, &schema.second_surname)?.unwrap_or_default();

        let id = leaf(element_map, &schema.id)?.unwrap_or_else(|| MISSING_ID.to_string());

        let empty = Map::new();
        let metadata = match lookup(element, &schema.metadata) {
            Lookup::Present(Value::Object(map)) => map,
            Lookup::Present(other) => {
                return Err(SkipReason::NotAnObject {
                    field: schema.metadata.clone(),
                    found: json_kind(other),
                });
            }
            Lookup::Absent | Lookup::WrongShape(_) => &empty,
        };

        let institution =
            leaf(metadata, &schema.institution)?.unwrap_or_else(|| MISSING_INSTITUTION.to_string());
        let last_updated =
            leaf(metadata, &schema.update_date)?.unwrap_or_else(|| MISSING_DATE.to_string());
        let declaration_type = if self.config.capture_declaration_type {
            let found = leaf(metadata, &schema.declaration_type)?;
            Some(found.unwrap_or_else(|| MISSING_TYPE.to_string()))
        } else {
            None
        };

        let mut record = PersonRecord::new(first_name, first_surname, second_surname)
            .with_id(id)
            .with_institution(institution)
            .with_last_updated(last_updated);
        record.declaration_type = declaration_type;

        if self.config.name_policy == NamePolicy::RequireNames && !record.has_required_names() {
            return Err(SkipReason::MissingNames);
        }

        Ok(record)
    }

    /// Follow the declaration path down to the general data object.
    ///
    /// Returns `Ok(None)` when any step is absent or the final object is
    /// empty.
    fn general_data<'a>(
        &self,
        element: &'a Value,
    ) -> Result<Option<&'a Map<String, Value>>, SkipReason> {
        let mut node = element;
        let mut parent = "record";

        for key in self.config.schema.general_data_path() {
            match lookup(node, key) {
                Lookup::Present(child) => {
                    node = child;
                    parent = key;
                }
                Lookup::Absent => return Ok(None),
                Lookup::WrongShape(found) => {
                    return Err(SkipReason::NotAnObject {
                        field: parent.to_string(),
                        found,
                    });
                }
            }
        }

        match node {
            Value::Object(map) if map.is_empty() => Ok(None),
            Value::Object(map) => Ok(Some(map)),
            other => Err(SkipReason::NotAnObject {
                field: parent.to_string(),
                found: json_kind(other),
            }),
        }
    }
}
