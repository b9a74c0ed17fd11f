use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{ConfidenceLevel, DocumentType, ExtractionStrategy};

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_registry_path")]
    pub registry_path: String,
    /// File extensions (without dot) picked up by a batch.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub strategy: ExtractionStrategy,
    #[serde(default)]
    pub max_pages: Option<u32>,
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
    /// Rewrite archaic spellings (`publick`, `vpon`) during conversion.
    #[serde(default)]
    pub modernize_spellings: bool,
    #[serde(default)]
    pub classification: ClassificationConfig,
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub filename_templates: BTreeMap<DocumentType, FilenameTemplate>,
    #[serde(default)]
    pub cleaning_rules: BTreeMap<DocumentType, CleaningRules>,
}

fn default_registry_path() -> String {
    "registry/master.db".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["pdf".to_string(), "docx".to_string()]
}

fn default_output_extension() -> String {
    "txt".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            registry_path: default_registry_path(),
            extensions: default_extensions(),
            strategy: ExtractionStrategy::default(),
            max_pages: None,
            output_extension: default_output_extension(),
            modernize_spellings: false,
            classification: ClassificationConfig::default(),
            metadata: MetadataConfig::default(),
            filename_templates: BTreeMap::new(),
            cleaning_rules: BTreeMap::new(),
        }
    }
}

// ---- classification ------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassificationConfig {
    #[serde(default)]
    pub rules: Vec<TypeRule>,
    /// Results below this level are reported as `unknown`.
    #[serde(default)]
    pub min_confidence: Option<ConfidenceLevel>,
}

/// Weighted patterns that vote for one document type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRule {
    pub document_type: DocumentType,
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub patterns: Vec<WeightedPattern>,
    #[serde(default)]
    pub thresholds: Thresholds,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedPattern {
    pub pattern: String,
    pub weight: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Score cut-offs for each confidence level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_high")]
    pub high: f64,
    #[serde(default = "default_medium")]
    pub medium: f64,
    #[serde(default = "default_low")]
    pub low: f64,
}

fn default_high() -> f64 {
    60.0
}

fn default_medium() -> f64 {
    30.0
}

fn default_low() -> f64 {
    10.0
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            high: default_high(),
            medium: default_medium(),
            low: default_low(),
        }
    }
}

// ---- metadata ------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataConfig {
    #[serde(default)]
    pub fields: BTreeMap<DocumentType, Vec<FieldPattern>>,
    /// Nested lookup table for the `abbreviate` transform, e.g.
    /// `{"courts": {"Georgia Court of Appeals": "Ga. Ct. App."}}`.
    #[serde(default)]
    pub abbreviations: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldPattern {
    pub name: String,
    /// Must contain a named group matching `name`.
    pub pattern: String,
    #[serde(default)]
    pub transform: Option<FieldTransform>,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default = "default_field_confidence")]
    pub confidence: ConfidenceLevel,
}

fn default_field_confidence() -> ConfidenceLevel {
    ConfidenceLevel::Medium
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldTransform {
    Slugify,
    Uppercase,
    Lowercase,
    Trim,
    Abbreviate,
}

// ---- filenames -----------------------------------------------------------

/// `pattern` uses `{field}` placeholders plus `{code}`; when `{code}` is
/// absent the code is appended as `----CODE`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilenameTemplate {
    pub pattern: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldFormat>,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
}

fn default_max_length() -> usize {
    255
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldFormat {
    #[serde(default)]
    pub style: FieldStyle,
    #[serde(default = "default_true")]
    pub required: bool,
    #[serde(default)]
    pub fallback: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStyle {
    /// Value used verbatim.
    #[default]
    Keep,
    /// `Ga. Ct. App.` becomes `Ga_Ct_App`.
    Underscore,
    /// `Smith & Co. v. Jones` becomes `Smith-and-Co-v-Jones`.
    Hyphen,
}

// ---- cleaning ------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningRules {
    #[serde(default)]
    pub noise_patterns: Vec<NoisePattern>,
    #[serde(default)]
    pub heading_patterns: Vec<HeadingPattern>,
}

/// Lines matching `pattern` at their start are deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoisePattern {
    pub pattern: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Lines matching `pattern` at their start get `markdown_prefix`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadingPattern {
    pub pattern: String,
    #[serde(default = "default_markdown_prefix")]
    pub markdown_prefix: String,
}

fn default_markdown_prefix() -> String {
    "## ".to_string()
}
