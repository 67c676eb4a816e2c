//! Duplicate person detection by exact identity.
//!
//! Records are grouped by their [`IdentityKey`]; only identities seen two or
//! more times are kept. Rows are ordered by occurrence count (descending),
//! then full name, then identity, so the order of identities does not depend
//! on the order records were read in. Within a group, rows keep insertion
//! order and carry their 1-based occurrence number.

use derive_builder::Builder;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

use persondup_core::{IdentityKey, PersonRecord};

/// Configuration for duplicate analysis.
#[derive(Debug, Clone, Default, Builder)]
#[builder(setter(into))]
pub struct AnalyzeConfig {
    /// Maximum number of duplicate groups to return (0 = unlimited).
    #[builder(default = "0")]
    pub max_groups: usize,
}

impl AnalyzeConfig {
    /// Create a new config builder.
    pub fn builder() -> AnalyzeConfigBuilder {
        AnalyzeConfigBuilder::default()
    }
}

/// One record that belongs to a duplicate group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRow {
    pub record: PersonRecord,
    /// Size of the record's group within the batch.
    pub occurrence_count: usize,
    /// 1-based position of the record within its group, in insertion order.
    pub occurrence_number: usize,
}

impl DuplicateRow {
    pub fn identity(&self) -> IdentityKey {
        self.record.identity()
    }
}

/// A borrowed view of the rows sharing one identity.
#[derive(Debug, Clone, Copy)]
pub struct DuplicateGroup<'a> {
    pub rows: &'a [DuplicateRow],
}

impl<'a> DuplicateGroup<'a> {
    pub fn identity(&self) -> IdentityKey {
        self.rows[0].identity()
    }

    /// Get the number of records sharing the identity.
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    pub fn full_name(&self) -> &'a str {
        &self.rows[0].record.full_name
    }
}

/// Results from duplicate analysis of one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateReport {
    /// Rows of every duplicate group, ordered as described in the module docs.
    pub rows: Vec<DuplicateRow>,
    /// Number of distinct identities that occur more than once.
    pub duplicate_identities: usize,
    /// Number of records in the analyzed batch.
    pub records_analyzed: usize,
}

impl DuplicateReport {
    /// True when no identity occurs more than once.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the number of duplicate rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Iterate over the duplicate groups in report order.
    pub fn groups(&self) -> impl Iterator<Item = DuplicateGroup<'_>> {
        self.rows
            .chunk_by(|a, b| a.record.same_identity(&b.record))
            .map(|rows| DuplicateGroup { rows })
    }
}

/// Groups person records by identity and reports the repeated ones.
pub struct DuplicateAnalyzer {
    config: AnalyzeConfig,
}

impl DuplicateAnalyzer {
    /// Create a new analyzer with default config.
    pub fn new() -> Self {
        Self {
            config: AnalyzeConfig::default(),
        }
    }

    /// Create a new analyzer with custom config.
    pub fn with_config(config: AnalyzeConfig) -> Self {
        Self { config }
    }

    /// Find the duplicated identities in a batch.
    pub fn analyze(&self, records: &[PersonRecord]) -> DuplicateReport {
        let records_analyzed = records.len();

        let mut groups: IndexMap<IdentityKey, Vec<&PersonRecord>> = IndexMap::new();
        for record in records {
            groups.entry(record.identity()).or_default().push(record);
        }
        groups.retain(|_, members| members.len() > 1);

        let mut ordered: Vec<(IdentityKey, Vec<&PersonRecord>)> = groups
            .into_iter()
            .sorted_by(|(key_a, a), (key_b, b)| {
                b.len()
                    .cmp(&a.len())
                    .then_with(|| a[0].full_name.cmp(&b[0].full_name))
                    .then_with(|| key_a.cmp(key_b))
            })
            .collect();

        if self.config.max_groups > 0 && ordered.len() > self.config.max_groups {
            ordered.truncate(self.config.max_groups);
        }

        let duplicate_identities = ordered.len();
        let rows: Vec<DuplicateRow> = ordered
            .into_iter()
            .flat_map(|(_, members)| {
                let occurrence_count = members.len();
                members
                    .into_iter()
                    .enumerate()
                    .map(move |(i, record)| DuplicateRow {
                        record: record.clone(),
                        occurrence_count,
                        occurrence_number: i + 1,
                    })
            })
            .collect();

        debug!(
            records = records_analyzed,
            rows = rows.len(),
            identities = duplicate_identities,
            "Analyzed batch"
        );

        DuplicateReport {
            rows,
            duplicate_identities,
            records_analyzed,
        }
    }
}

impl Default for DuplicateAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}
