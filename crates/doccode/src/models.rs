//! Value types shared by the registry, the collaborators and the pipeline.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error for text values that do not name a known enum variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Caselaw,
    Article,
    Statute,
    Brief,
    Book,
    Unknown,
}

text_enum!(DocumentType, "document type", {
    Caselaw => "caselaw",
    Article => "article",
    Statute => "statute",
    Brief => "brief",
    Book => "book",
    Unknown => "unknown",
});

impl DocumentType {
    pub const ALL: [DocumentType; 6] = [
        Self::Caselaw,
        Self::Article,
        Self::Statute,
        Self::Brief,
        Self::Book,
        Self::Unknown,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    InProgress,
    Success,
    Failed,
    Skipped,
}

text_enum!(ProcessingStatus, "processing status", {
    Pending => "pending",
    InProgress => "in_progress",
    Success => "success",
    Failed => "failed",
    Skipped => "skipped",
});

impl ProcessingStatus {
    /// Terminal statuses get a `completed_at` timestamp when recorded.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Skipped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

text_enum!(ConfidenceLevel, "confidence level", {
    High => "HIGH",
    Medium => "MEDIUM",
    Low => "LOW",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionSource {
    Document,
    Filename,
    Fallback,
}

text_enum!(ExtractionSource, "extraction source", {
    Document => "document",
    Filename => "filename",
    Fallback => "fallback",
});

/// Lifecycle of a row in the `codes` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeStatus {
    Allocated,
    InUse,
}

text_enum!(CodeStatus, "code status", {
    Allocated => "allocated",
    InUse => "in_use",
});

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Classification confidence must be within [0, 1], got {0}")]
pub struct InvalidConfidence(pub f64);

/// Outcome of document-type classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    document_type: DocumentType,
    confidence: f64,
    indicators: Vec<String>,
}

impl Classification {
    pub fn new(
        document_type: DocumentType,
        confidence: f64,
        indicators: Vec<String>,
    ) -> Result<Self, InvalidConfidence> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(InvalidConfidence(confidence));
        }
        Ok(Self {
            document_type,
            confidence,
            indicators,
        })
    }

    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            document_type: DocumentType::Unknown,
            confidence: 0.0,
            indicators: vec![reason.into()],
        }
    }

    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }
}

/// One extracted metadata value with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataField {
    pub key: String,
    pub value: String,
    pub source: ExtractionSource,
    pub confidence: ConfidenceLevel,
    pub extractor_name: Option<String>,
    pub extracted_at: DateTime<Utc>,
}

impl MetadataField {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        source: ExtractionSource,
        confidence: ConfidenceLevel,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            source,
            confidence,
            extractor_name: None,
            extracted_at: Utc::now(),
        }
    }

    pub fn with_extractor(mut self, name: impl Into<String>) -> Self {
        self.extractor_name = Some(name.into());
        self
    }
}

/// Metadata extracted for one document, keyed by field name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub document_type: DocumentType,
    pub fields: BTreeMap<String, MetadataField>,
}

impl DocumentMetadata {
    pub fn new(document_type: DocumentType) -> Self {
        Self {
            document_type,
            fields: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, field: MetadataField) {
        self.fields.insert(field.key.clone(), field);
    }

    pub fn get_value(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(|f| f.value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Plain key/value view used by filename formatting and frontmatter.
    pub fn values(&self) -> BTreeMap<String, String> {
        self.fields
            .iter()
            .map(|(k, f)| (k.clone(), f.value.clone()))
            .collect()
    }
}

/// Text produced by a [`TextExtractor`](crate::services::TextExtractor).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: Option<u32>,
}

impl ExtractedText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            page_count: None,
        }
    }
}

/// Extraction depth requested from the extractor backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStrategy {
    #[default]
    Fast,
    Deep,
}

text_enum!(ExtractionStrategy, "extraction strategy", {
    Fast => "fast",
    Deep => "deep",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_type_text_round_trip() {
        for ty in DocumentType::ALL {
            assert_eq!(ty.as_str().parse::<DocumentType>().unwrap(), ty);
        }
        assert!("memo".parse::<DocumentType>().is_err());
    }

    #[test]
    fn test_serde_matches_stored_text() {
        assert_eq!(
            serde_json::to_string(&ProcessingStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&ConfidenceLevel::High).unwrap(),
            "\"HIGH\""
        );
        assert_eq!(serde_json::to_string(&CodeStatus::InUse).unwrap(), "\"in_use\"");
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(ProcessingStatus::Success.is_terminal());
        assert!(ProcessingStatus::Failed.is_terminal());
        assert!(ProcessingStatus::Skipped.is_terminal());
        assert!(!ProcessingStatus::Pending.is_terminal());
        assert!(!ProcessingStatus::InProgress.is_terminal());
    }

    #[test]
    fn test_classification_rejects_out_of_range() {
        assert!(Classification::new(DocumentType::Caselaw, 1.5, vec![]).is_err());
        assert!(Classification::new(DocumentType::Caselaw, -0.1, vec![]).is_err());
        assert!(Classification::new(DocumentType::Caselaw, f64::NAN, vec![]).is_err());

        let c = Classification::new(DocumentType::Caselaw, 0.75, vec!["caption".into()]).unwrap();
        assert_eq!(c.document_type(), DocumentType::Caselaw);
        assert_eq!(c.confidence(), 0.75);
        assert_eq!(c.indicators(), ["caption".to_string()]);
    }

    #[test]
    fn test_metadata_values() {
        let mut metadata = DocumentMetadata::new(DocumentType::Statute);
        assert!(metadata.is_empty());

        metadata.insert(
            MetadataField::new("year", "1998", ExtractionSource::Document, ConfidenceLevel::High)
                .with_extractor("pattern"),
        );
        assert_eq!(metadata.get_value("year"), Some("1998"));
        assert_eq!(metadata.get_value("court"), None);
        assert_eq!(metadata.values().get("year").map(String::as_str), Some("1998"));
    }
}
