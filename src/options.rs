//! Conversion options.
//!
//! Plain configuration structs with documented defaults. They can be built in
//! code with struct-update syntax or loaded from a JSON options file; the
//! engine only ever reads them through shared references.
//!
//! ```
//! use gbconvert::options::{ConversionOptions, TranslationOptions};
//!
//! let options = ConversionOptions {
//!     merge_sequences: true,
//!     translation: TranslationOptions {
//!         table_id: Some(11),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! assert!(options.translation.translate_cds);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{ConvertError, ConvertResult};
use crate::formats::FileFormat;
use crate::genetic_code::{self, GeneticCodeTable};
use crate::model::Topology;

/// Default number of residues per ORIGIN line.
pub const DEFAULT_SEQUENCE_LINE_WIDTH: usize = 60;

/// Division code used when neither the sequence nor the options name one.
pub const DEFAULT_DIVISION: &str = "UNK";

/// Top-level options for one conversion.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConversionOptions {
    /// Overrides the organism of every record
    pub organism: Option<String>,
    /// Overrides the LOCUS molecule type (default "DNA")
    pub molecule_type: Option<String>,
    /// Overrides the LOCUS topology (default linear)
    pub topology: Option<Topology>,
    /// Overrides the LOCUS division code (default "UNK")
    pub division: Option<String>,
    /// Skip detection for the sequence input
    pub sequence_format: Option<FileFormat>,
    /// Skip detection for the annotation input
    pub annotation_format: Option<FileFormat>,
    /// Concatenate all input sequences into a single record
    pub merge_sequences: bool,
    /// Fail the conversion when validation reports errors
    pub strict: bool,
    /// Stream formatted output through a temporary file
    pub memory_efficient: bool,
    pub translation: TranslationOptions,
    pub features: FeatureFormattingOptions,
    pub output: OutputFormattingOptions,
    pub filter: FeatureFilterOptions,
    /// Free-form metadata, emitted as a COMMENT block
    pub custom_metadata: BTreeMap<String, String>,
}

impl ConversionOptions {
    /// Loads options from a JSON file. Every key is optional.
    pub fn from_json_file(path: &Path) -> ConvertResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConvertError::FileProcessing {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
            .map_err(|e| ConvertError::Conversion(format!("invalid options file {}: {}", path.display(), e)))
    }

    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

/// Genetic code selection and CDS translation policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TranslationOptions {
    /// NCBI table number; highest precedence
    pub table_id: Option<u8>,
    /// Free-text code name or number; kept verbatim for display
    pub genetic_code: Option<String>,
    /// Enum constant; lowest precedence
    pub table: Option<GeneticCodeTable>,
    /// Append `*` when translation stops at a stop codon
    pub include_stop_codon: bool,
    /// Translate through internal stop codons instead of halting
    pub allow_internal_stop_codons: bool,
    /// Add a /translation qualifier to CDS features
    pub translate_cds: bool,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            table_id: None,
            genetic_code: None,
            table: None,
            include_stop_codon: false,
            allow_internal_stop_codons: false,
            translate_cds: true,
        }
    }
}

impl TranslationOptions {
    /// The free-text genetic code exactly as supplied.
    pub fn genetic_code(&self) -> Option<&str> {
        self.genetic_code.as_deref()
    }

    /// The table that drives translation.
    pub fn resolve_table(&self) -> ConvertResult<GeneticCodeTable> {
        genetic_code::resolve_table(self.table_id, self.genetic_code.as_deref(), self.table)
    }
}

/// Feature table presentation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureFormattingOptions {
    /// Map synonymous feature types onto GenBank feature keys
    pub standardize_feature_types: bool,
    /// Emit a `source` feature spanning each record
    pub include_source_feature: bool,
}

impl Default for FeatureFormattingOptions {
    fn default() -> Self {
        Self {
            standardize_feature_types: false,
            include_source_feature: true,
        }
    }
}

/// ORIGIN block and LOCUS date presentation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputFormattingOptions {
    /// Residues per ORIGIN line, in groups of 10
    pub sequence_line_width: usize,
    /// Render the ORIGIN block in lowercase; uppercase otherwise
    pub lowercase_sequence: bool,
    /// Fixed LOCUS date; today's date when absent
    pub record_date: Option<NaiveDate>,
}

impl Default for OutputFormattingOptions {
    fn default() -> Self {
        Self {
            sequence_line_width: DEFAULT_SEQUENCE_LINE_WIDTH,
            lowercase_sequence: true,
            record_date: None,
        }
    }
}

impl OutputFormattingOptions {
    /// Line width with zero mapped to the default.
    pub fn line_width(&self) -> usize {
        if self.sequence_line_width == 0 {
            DEFAULT_SEQUENCE_LINE_WIDTH
        } else {
            self.sequence_line_width
        }
    }
}

/// Feature type include/exclude sets. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FeatureFilterOptions {
    /// When non-empty, only these types are kept
    pub include_feature_types: BTreeSet<String>,
    /// These types are always dropped
    pub exclude_feature_types: BTreeSet<String>,
}

impl FeatureFilterOptions {
    pub fn accepts(&self, kind: &str) -> bool {
        (self.include_feature_types.is_empty() || self.include_feature_types.contains(kind))
            && !self.exclude_feature_types.contains(kind)
    }
}
