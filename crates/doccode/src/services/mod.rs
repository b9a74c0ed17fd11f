//! Collaborators called by the pipeline stages.
//!
//! Each concern sits behind a trait so the stages can be driven by the
//! rule-based implementations in this module or by plugins (a PDF backend,
//! a domain-specific metadata extractor, test fakes).

pub mod classifier;
pub mod extractor;
pub mod formatter;
pub mod metadata;

use std::collections::BTreeMap;
use std::path::Path;

use crate::codes::Code;
use crate::config::Config;
use crate::error::ProcessError;
use crate::models::{
    Classification, DocumentMetadata, DocumentType, ExtractedText, ExtractionStrategy,
};

pub use classifier::RuleClassifier;
pub use extractor::{ExtractorRegistry, PlainTextExtractor};
pub use formatter::TemplateFilenameFormatter;
pub use metadata::PatternMetadataExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "text" | "md" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub strategy: ExtractionStrategy,
    /// Stop after this many pages; `None` reads the whole document.
    pub max_pages: Option<u32>,
}

impl ExtractOptions {
    pub fn new(strategy: ExtractionStrategy) -> Self {
        Self {
            strategy,
            max_pages: None,
        }
    }
}

pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path, options: &ExtractOptions) -> Result<ExtractedText, ProcessError>;
    fn supports(&self, format: DocumentFormat, strategy: ExtractionStrategy) -> bool;
}

pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> Classification;
}

pub trait MetadataExtractor: Send + Sync {
    fn extract_metadata(&self, document_type: DocumentType, text: &str) -> DocumentMetadata;
}

pub trait FilenameFormatter: Send + Sync {
    /// Builds the new file name, or `None` when required fields are missing.
    fn format_filename(
        &self,
        document_type: DocumentType,
        fields: &BTreeMap<String, String>,
        code: &Code,
        extension: &str,
    ) -> Option<String>;
}

/// The collaborator set one batch runs with.
pub struct Collaborators {
    pub extractors: ExtractorRegistry,
    pub classifier: Box<dyn Classifier>,
    pub metadata: Box<dyn MetadataExtractor>,
    pub formatter: Box<dyn FilenameFormatter>,
}

impl Collaborators {
    /// Rule-driven collaborators built from `config`, with plain-text
    /// extraction only. Register further backends on `extractors`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            extractors: ExtractorRegistry::new(),
            classifier: Box::new(RuleClassifier::new(&config.classification)),
            metadata: Box::new(PatternMetadataExtractor::new(&config.metadata)),
            formatter: Box::new(TemplateFilenameFormatter::new(
                config.filename_templates.clone(),
            )),
        }
    }
}
