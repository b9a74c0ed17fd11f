use std::collections::BTreeMap;

use regex::Regex;

use crate::config::abbreviations::{self, AbbreviationTable};
use crate::config::schema::{FieldPattern, FieldTransform, MetadataConfig};
use crate::models::{
    ConfidenceLevel, DocumentMetadata, DocumentType, ExtractionSource, MetadataField,
};
use crate::services::MetadataExtractor;

const EXTRACTOR_NAME: &str = "pattern";

/// Pulls fields out of document text with one named-capture regex per field.
pub struct PatternMetadataExtractor {
    patterns: BTreeMap<DocumentType, Vec<CompiledPattern>>,
    abbreviations: AbbreviationTable,
}

struct CompiledPattern {
    name: String,
    regex: Regex,
    transform: Option<FieldTransform>,
    default: Option<String>,
    confidence: ConfidenceLevel,
}

impl PatternMetadataExtractor {
    pub fn new(config: &MetadataConfig) -> Self {
        let patterns = config
            .fields
            .iter()
            .map(|(doc_type, fields)| (*doc_type, compile(fields)))
            .collect();

        Self {
            patterns,
            abbreviations: abbreviations::flatten(&config.abbreviations),
        }
    }

    fn apply_transform(&self, value: &str, transform: FieldTransform) -> String {
        match transform {
            FieldTransform::Slugify => slugify(value),
            FieldTransform::Uppercase => value.to_uppercase(),
            FieldTransform::Lowercase => value.to_lowercase(),
            FieldTransform::Trim => value.trim().to_string(),
            FieldTransform::Abbreviate => abbreviations::abbreviate(&self.abbreviations, value),
        }
    }
}

fn compile(fields: &[FieldPattern]) -> Vec<CompiledPattern> {
    fields
        .iter()
        .filter_map(|field| match Regex::new(&field.pattern) {
            Ok(regex) => Some(CompiledPattern {
                name: field.name.clone(),
                regex,
                transform: field.transform,
                default: field.default.clone(),
                confidence: field.confidence,
            }),
            Err(e) => {
                log::warn!("Skipping metadata pattern '{}': {}", field.name, e);
                None
            }
        })
        .collect()
}

impl MetadataExtractor for PatternMetadataExtractor {
    fn extract_metadata(&self, document_type: DocumentType, text: &str) -> DocumentMetadata {
        let mut metadata = DocumentMetadata::new(document_type);
        let Some(patterns) = self.patterns.get(&document_type) else {
            return metadata;
        };

        for pattern in patterns {
            let captured = pattern
                .regex
                .captures(text)
                .and_then(|caps| caps.name(&pattern.name).map(|m| m.as_str().trim().to_string()))
                .map(|value| match pattern.transform {
                    Some(transform) => self.apply_transform(&value, transform),
                    None => value,
                })
                .filter(|value| !value.is_empty());

            let field = match (captured, &pattern.default) {
                (Some(value), _) => MetadataField::new(
                    &pattern.name,
                    value,
                    ExtractionSource::Document,
                    pattern.confidence,
                ),
                (None, Some(default)) => MetadataField::new(
                    &pattern.name,
                    default.clone(),
                    ExtractionSource::Fallback,
                    ConfidenceLevel::Low,
                ),
                (None, None) => continue,
            };
            metadata.insert(field.with_extractor(EXTRACTOR_NAME));
        }

        metadata
    }
}

fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(name: &str, pattern: &str) -> FieldPattern {
        FieldPattern {
            name: name.to_string(),
            pattern: pattern.to_string(),
            transform: None,
            default: None,
            confidence: ConfidenceLevel::Medium,
        }
    }

    fn config(fields: Vec<FieldPattern>) -> MetadataConfig {
        MetadataConfig {
            fields: BTreeMap::from([(DocumentType::Caselaw, fields)]),
            abbreviations: json!({
                "courts": { "Court of Appeals of Georgia": "Ga. Ct. App." }
            }),
        }
    }

    const OPINION: &str = "IN THE COURT OF APPEALS OF GEORGIA\n\
        Smith v. Jones\n\
        Decided: March 3, 2014\n\
        328 Ga. App. 524";

    #[test]
    fn test_extract_named_captures() {
        let extractor = PatternMetadataExtractor::new(&config(vec![
            field("year", r"Decided:.*?(?P<year>\d{4})"),
            field("citation", r"(?P<citation>\d+ Ga\. App\. \d+)"),
        ]));

        let metadata = extractor.extract_metadata(DocumentType::Caselaw, OPINION);
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata.get_value("year"), Some("2014"));
        assert_eq!(metadata.get_value("citation"), Some("328 Ga. App. 524"));

        let year = &metadata.fields["year"];
        assert_eq!(year.source, ExtractionSource::Document);
        assert_eq!(year.confidence, ConfidenceLevel::Medium);
        assert_eq!(year.extractor_name.as_deref(), Some("pattern"));
    }

    #[test]
    fn test_transforms() {
        let mut court = field("court", r"(?i)IN THE (?P<court>court of appeals of georgia)");
        court.transform = Some(FieldTransform::Abbreviate);
        let mut name = field("case_name", r"(?m)^(?<case_name>\w+ v\. \w+)$");
        name.transform = Some(FieldTransform::Slugify);

        let extractor = PatternMetadataExtractor::new(&config(vec![court, name]));
        let metadata = extractor.extract_metadata(DocumentType::Caselaw, OPINION);

        assert_eq!(metadata.get_value("court"), Some("Ga. Ct. App."));
        assert_eq!(metadata.get_value("case_name"), Some("smith-v-jones"));
    }

    #[test]
    fn test_default_used_when_missing() {
        let mut docket = field("docket", r"Docket No\. (?P<docket>\S+)");
        docket.default = Some("none".to_string());

        let extractor = PatternMetadataExtractor::new(&config(vec![docket]));
        let metadata = extractor.extract_metadata(DocumentType::Caselaw, OPINION);

        let docket = &metadata.fields["docket"];
        assert_eq!(docket.value, "none");
        assert_eq!(docket.source, ExtractionSource::Fallback);
        assert_eq!(docket.confidence, ConfidenceLevel::Low);
    }

    #[test]
    fn test_missing_without_default_is_omitted() {
        let extractor =
            PatternMetadataExtractor::new(&config(vec![field("docket", r"Docket (?P<docket>\d+)")]));
        assert!(extractor
            .extract_metadata(DocumentType::Caselaw, OPINION)
            .is_empty());
    }

    #[test]
    fn test_type_without_patterns() {
        let extractor = PatternMetadataExtractor::new(&config(vec![field("year", r"(?P<year>\d{4})")]));
        let metadata = extractor.extract_metadata(DocumentType::Article, OPINION);
        assert!(metadata.is_empty());
        assert_eq!(metadata.document_type, DocumentType::Article);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(slugify("Smith & Co."), "smith-co");
    }
}
