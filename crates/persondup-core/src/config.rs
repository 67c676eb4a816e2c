//! Scan and extraction configuration types.

use std::fs;
use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::ScanError;

/// How the source root is traversed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// Walk the whole subtree and build one batch.
    #[default]
    Tree,
    /// One batch per immediate child directory of the root.
    Partitioned,
}

impl ScanMode {
    /// Files between two progress log lines.
    pub fn default_progress_interval(self) -> u64 {
        match self {
            ScanMode::Tree => 100,
            ScanMode::Partitioned => 10,
        }
    }
}

/// Whether a record needs its first name and first surname to be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamePolicy {
    /// Drop records whose first name or first surname is empty.
    RequireNames,
    /// Emit every record that has a general data section, even nameless ones.
    AllowEmpty,
}

/// JSON keys used to locate the person data inside a declaration document.
///
/// Defaults to the field names of the declaration format. Any key missing
/// from a schema file keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordSchema {
    pub declaration: String,
    pub patrimonial_situation: String,
    pub general_data: String,
    pub first_name: String,
    pub first_surname: String,
    pub second_surname: String,
    pub id: String,
    pub metadata: String,
    pub institution: String,
    pub update_date: String,
    pub declaration_type: String,
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self {
            declaration: "declaracion".to_string(),
            patrimonial_situation: "situacionPatrimonial".to_string(),
            general_data: "datosGenerales".to_string(),
            first_name: "nombre".to_string(),
            first_surname: "primerApellido".to_string(),
            second_surname: "segundoApellido".to_string(),
            id: "id".to_string(),
            metadata: "metadata".to_string(),
            institution: "institucion".to_string(),
            update_date: "actualizacion".to_string(),
            declaration_type: "tipo".to_string(),
        }
    }
}

impl RecordSchema {
    /// Load a schema override from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| ScanError::io(path, e))?;
        serde_json::from_slice(&bytes).map_err(|source| ScanError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The nested path leading to the general data object.
    pub fn general_data_path(&self) -> [&str; 3] {
        [
            self.declaration.as_str(),
            self.patrimonial_situation.as_str(),
            self.general_data.as_str(),
        ]
    }
}

/// Configuration for record extraction.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct ExtractConfig {
    /// Field names to read.
    #[builder(default)]
    #[serde(default)]
    pub schema: RecordSchema,

    /// Name guard applied before a record is emitted.
    #[builder(default = "NamePolicy::RequireNames")]
    #[serde(default = "default_name_policy")]
    pub name_policy: NamePolicy,

    /// Read the declaration type from the metadata.
    #[builder(default = "false")]
    #[serde(default)]
    pub capture_declaration_type: bool,
}

fn default_name_policy() -> NamePolicy {
    NamePolicy::RequireNames
}

impl ExtractConfig {
    /// Create a new extract config builder.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::default()
    }

    /// Settings used by the whole-tree scan.
    pub fn whole_tree() -> Self {
        Self {
            schema: RecordSchema::default(),
            name_policy: NamePolicy::RequireNames,
            capture_declaration_type: false,
        }
    }

    /// Settings used by the per-directory scans.
    pub fn partitioned() -> Self {
        Self {
            schema: RecordSchema::default(),
            name_policy: NamePolicy::AllowEmpty,
            capture_declaration_type: true,
        }
    }

    /// Default settings for a scan mode.
    pub fn for_mode(mode: ScanMode) -> Self {
        match mode {
            ScanMode::Tree => Self::whole_tree(),
            ScanMode::Partitioned => Self::partitioned(),
        }
    }

    pub fn with_schema(mut self, schema: RecordSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_name_policy(mut self, name_policy: NamePolicy) -> Self {
        self.name_policy = name_policy;
        self
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self::whole_tree()
    }
}

/// Configuration for scanning operations.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root path to scan.
    pub root: PathBuf,

    /// Traversal mode.
    #[builder(default)]
    #[serde(default)]
    pub mode: ScanMode,

    /// Files between progress updates (0 = mode default).
    #[builder(default = "0")]
    #[serde(default)]
    pub progress_interval: u64,

    /// Extraction settings (None = mode default).
    #[builder(default)]
    #[serde(default)]
    pub extract: Option<ExtractConfig>,
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(ref root) = self.root {
            if root.as_os_str().is_empty() {
                return Err("Root path cannot be empty".to_string());
            }
        } else {
            return Err("Root path is required".to_string());
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a whole-tree config for a path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::for_mode(root, ScanMode::Tree)
    }

    /// Create a per-directory config for a path.
    pub fn partitioned(root: impl Into<PathBuf>) -> Self {
        Self::for_mode(root, ScanMode::Partitioned)
    }

    /// Create a config for a path and mode with default settings.
    pub fn for_mode(root: impl Into<PathBuf>, mode: ScanMode) -> Self {
        Self {
            root: root.into(),
            mode,
            progress_interval: 0,
            extract: None,
        }
    }

    pub fn with_extract(mut self, extract: ExtractConfig) -> Self {
        self.extract = Some(extract);
        self
    }

    /// Files between progress updates, resolved against the mode default.
    pub fn progress_every(&self) -> u64 {
        match self.progress_interval {
            0 => self.mode.default_progress_interval(),
            n => n,
        }
    }

    /// Extraction settings, resolved against the mode default.
    pub fn extract_config(&self) -> ExtractConfig {
        self.extract
            .clone()
            .unwrap_or_else(|| ExtractConfig::for_mode(self.mode))
    }

    /// Check whether a file name has a `.json` extension (any case).
    pub fn accepts_file(&self, name: &str) -> bool {
        name.len() >= 5
            && name
                .get(name.len() - 5..)
                .is_some_and(|ext| ext.eq_ignore_ascii_case(".json"))
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .root("/data/declarations")
            .mode(ScanMode::Partitioned)
            .progress_interval(25u64)
            .build()
            .unwrap();

        assert_eq!(config.root, PathBuf::from("/data/declarations"));
        assert_eq!(config.mode, ScanMode::Partitioned);
        assert_eq!(config.progress_every(), 25);
        assert_eq!(config.extract_config().name_policy, NamePolicy::AllowEmpty);
    }

    #[test]
    fn test_builder_rejects_empty_root() {
        assert!(ScanConfig::builder().root("").build().is_err());
        assert!(ScanConfig::builder().build().is_err());
    }

    #[test]
    fn test_mode_defaults() {
        let tree = ScanConfig::new("/data");
        assert_eq!(tree.progress_every(), 100);
        let extract = tree.extract_config();
        assert_eq!(extract.name_policy, NamePolicy::RequireNames);
        assert!(!extract.capture_declaration_type);

        let partitioned = ScanConfig::partitioned("/data");
        assert_eq!(partitioned.progress_every(), 10);
        let extract = partitioned.extract_config();
        assert_eq!(extract.name_policy, NamePolicy::AllowEmpty);
        assert!(extract.capture_declaration_type);
    }

    #[test]
    fn test_explicit_extract_overrides_mode() {
        let config = ScanConfig::partitioned("/data")
            .with_extract(ExtractConfig::partitioned().with_name_policy(NamePolicy::RequireNames));
        assert_eq!(config.extract_config().name_policy, NamePolicy::RequireNames);
    }

    #[test]
    fn test_accepts_file() {
        let config = ScanConfig::new("/data");
        assert!(config.accepts_file("record.json"));
        assert!(config.accepts_file("RECORD.JSON"));
        assert!(config.accepts_file("a.Json"));
        assert!(!config.accepts_file("json"));
        assert!(!config.accepts_file("record.jsonl"));
        assert!(!config.accepts_file("notes.txt"));
        assert!(!config.accepts_file("ñandú"));
    }

    #[test]
    fn test_scan_mode_strings() {
        assert_eq!(ScanMode::Tree.to_string(), "tree");
        assert_eq!(ScanMode::Partitioned.to_string(), "partitioned");
        assert_eq!("partitioned".parse::<ScanMode>().unwrap(), ScanMode::Partitioned);
    }

    #[test]
    fn test_schema_partial_override() {
        let schema: RecordSchema =
            serde_json::from_str(r#"{"declaration": "declaration", "first_name": "name"}"#)
                .unwrap();
        assert_eq!(schema.declaration, "declaration");
        assert_eq!(schema.first_name, "name");
        assert_eq!(schema.first_surname, "primerApellido");
        assert_eq!(
            RecordSchema::default().general_data_path(),
            ["declaracion", "situacionPatrimonial", "datosGenerales"]
        );
    }
}
