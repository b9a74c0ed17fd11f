use std::collections::HashSet;
use std::path::Path;

use regex::Regex;

use crate::config::schema::{Config, FilenameTemplate, CONFIG_VERSION};
use crate::error::ConfigError;

/// Loads a config file; `.yaml`/`.yml` files are read as YAML, everything
/// else as JSON.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    if is_yaml {
        load_config_from_yaml_str(&content)
    } else {
        load_config_from_str(&content)
    }
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn load_config_from_yaml_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_yaml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.extensions.is_empty() {
        return Err(ConfigError::Validation {
            message: "At least one file extension is required".to_string(),
        });
    }
    for ext in config
        .extensions
        .iter()
        .chain(std::iter::once(&config.output_extension))
    {
        if ext.is_empty() || ext.contains('.') || ext.contains('/') || ext.contains('\\') {
            return Err(ConfigError::Validation {
                message: format!("Invalid file extension '{}': use a bare name like 'pdf'", ext),
            });
        }
    }
    if config
        .extensions
        .iter()
        .any(|e| e.eq_ignore_ascii_case(&config.output_extension))
    {
        return Err(ConfigError::Validation {
            message: format!(
                "Output extension '{}' must not be one of the input extensions",
                config.output_extension
            ),
        });
    }

    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation {
            message: "max_pages must be at least 1".to_string(),
        });
    }

    // Classification rules
    let mut seen_types = HashSet::new();
    for rule in &config.classification.rules {
        let id = rule.document_type.to_string();
        if !seen_types.insert(rule.document_type) {
            return Err(ConfigError::InvalidRule {
                id,
                reason: "Duplicate classification rule for document type".to_string(),
            });
        }
        if rule.patterns.is_empty() {
            return Err(ConfigError::InvalidRule {
                id,
                reason: "Classification rule has no patterns".to_string(),
            });
        }
        let t = &rule.thresholds;
        if !(t.high >= t.medium && t.medium >= t.low && t.low >= 0.0) {
            return Err(ConfigError::InvalidRule {
                id,
                reason: format!(
                    "Thresholds must satisfy high >= medium >= low >= 0 (got {}, {}, {})",
                    t.high, t.medium, t.low
                ),
            });
        }
        for pattern in &rule.patterns {
            if let Err(e) = Regex::new(&pattern.pattern) {
                return Err(ConfigError::InvalidRule {
                    id,
                    reason: format!("Invalid regex pattern: {}", e),
                });
            }
            if !pattern.weight.is_finite() {
                return Err(ConfigError::InvalidRule {
                    id,
                    reason: format!("Pattern '{}' has a non-finite weight", pattern.pattern),
                });
            }
        }
    }

    // Metadata field patterns
    for fields in config.metadata.fields.values() {
        for field in fields {
            let regex = Regex::new(&field.pattern).map_err(|e| ConfigError::InvalidPattern {
                name: field.name.clone(),
                reason: e.to_string(),
            })?;

            if !regex.capture_names().flatten().any(|n| n == field.name) {
                return Err(ConfigError::InvalidPattern {
                    name: field.name.clone(),
                    reason: format!(
                        "Pattern must contain named capture group '?P<{}>' or '?<{}>'",
                        field.name, field.name
                    ),
                });
            }
        }
    }
    if !(config.metadata.abbreviations.is_null() || config.metadata.abbreviations.is_object()) {
        return Err(ConfigError::Validation {
            message: "metadata.abbreviations must be a mapping".to_string(),
        });
    }

    for (doc_type, template) in &config.filename_templates {
        validate_template(&doc_type.to_string(), template)?;
    }

    for (doc_type, rules) in &config.cleaning_rules {
        let patterns = rules
            .noise_patterns
            .iter()
            .map(|p| &p.pattern)
            .chain(rules.heading_patterns.iter().map(|p| &p.pattern));
        for pattern in patterns {
            if let Err(e) = Regex::new(pattern) {
                return Err(ConfigError::InvalidRule {
                    id: format!("cleaning_rules.{}", doc_type),
                    reason: format!("Invalid regex pattern: {}", e),
                });
            }
        }
    }

    Ok(())
}

fn validate_template(id: &str, template: &FilenameTemplate) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidRule {
        id: format!("filename_templates.{}", id),
        reason,
    };

    if template.pattern.trim().is_empty() {
        return Err(invalid("Template pattern is empty".to_string()));
    }
    if template.pattern.contains('/') || template.pattern.contains('\\') {
        return Err(invalid("Template pattern contains path separators".to_string()));
    }
    if template.max_length < 16 {
        return Err(invalid(format!(
            "max_length {} is too short for a coded filename",
            template.max_length
        )));
    }

    let mut depth = 0usize;
    for c in template.pattern.chars() {
        match c {
            '{' if depth == 0 => depth = 1,
            '}' if depth == 1 => depth = 0,
            '{' | '}' => {
                return Err(invalid(format!(
                    "Unbalanced braces in pattern '{}'",
                    template.pattern
                )))
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(invalid(format!(
            "Unbalanced braces in pattern '{}'",
            template.pattern
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DocumentType;

    #[test]
    fn test_load_valid_json_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "registry_path": "/data/registry.db",
            "extensions": ["pdf"],
            "strategy": "deep",
            "max_pages": 5,
            "classification": {
                "rules": [
                    {
                        "document_type": "caselaw",
                        "patterns": [
                            { "pattern": "\\bv\\.\\s+\\w+", "weight": 40, "description": "caption" }
                        ]
                    }
                ]
            }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.registry_path, "/data/registry.db");
        assert_eq!(config.extensions, vec!["pdf"]);
        assert_eq!(config.max_pages, Some(5));
        assert_eq!(
            config.classification.rules[0].document_type,
            DocumentType::Caselaw
        );
    }

    #[test]
    fn test_load_valid_yaml_config() {
        let config_yaml = r#"
version: "1.0"
metadata:
  fields:
    statute:
      - name: year
        pattern: '(?P<year>\d{4})'
  abbreviations:
    states:
      georgia: Ga.
filename_templates:
  statute:
    pattern: "s.{year}"
    fields:
      year: { style: keep }
cleaning_rules:
  statute:
    heading_patterns:
      - pattern: '^SECTION \d+'
        markdown_prefix: '# '
"#;

        let config = load_config_from_yaml_str(config_yaml).unwrap();
        assert_eq!(config.metadata.fields[&DocumentType::Statute].len(), 1);
        assert_eq!(config.filename_templates[&DocumentType::Statute].max_length, 255);
        assert_eq!(
            config.cleaning_rules[&DocumentType::Statute].heading_patterns[0].markdown_prefix,
            "# "
        );
    }

    #[test]
    fn test_load_config_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("doccode.yml");
        std::fs::write(&yaml, "version: \"1.0\"\nextensions: [pdf]\n").unwrap();
        assert_eq!(load_config(&yaml).unwrap().extensions, vec!["pdf"]);

        let json = dir.path().join("doccode.json");
        std::fs::write(&json, r#"{ "version": "1.0" }"#).unwrap();
        assert_eq!(load_config(&json).unwrap().extensions, vec!["pdf", "docx"]);

        assert!(matches!(
            load_config(dir.path().join("missing.json")),
            Err(ConfigError::ReadFile { .. })
        ));
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_invalid_extensions() {
        assert!(load_config_from_str(r#"{ "version": "1.0", "extensions": [] }"#).is_err());
        assert!(load_config_from_str(r#"{ "version": "1.0", "extensions": [".pdf"] }"#).is_err());
        assert!(load_config_from_str(
            r#"{ "version": "1.0", "extensions": ["txt"], "output_extension": "txt" }"#
        )
        .is_err());
    }

    #[test]
    fn test_invalid_classification_regex() {
        let config_json = r#"
        {
            "version": "1.0",
            "classification": {
                "rules": [
                    { "document_type": "brief", "patterns": [{ "pattern": "([unclosed", "weight": 10 }] }
                ]
            }
        }
        "#;
        assert!(matches!(
            load_config_from_str(config_json),
            Err(ConfigError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_duplicate_classification_rule() {
        let config_json = r#"
        {
            "version": "1.0",
            "classification": {
                "rules": [
                    { "document_type": "brief", "patterns": [{ "pattern": "brief", "weight": 10 }] },
                    { "document_type": "brief", "patterns": [{ "pattern": "memo", "weight": 10 }] }
                ]
            }
        }
        "#;
        assert!(load_config_from_str(config_json).is_err());
    }

    #[test]
    fn test_inverted_thresholds() {
        let config_json = r#"
        {
            "version": "1.0",
            "classification": {
                "rules": [
                    {
                        "document_type": "book",
                        "patterns": [{ "pattern": "ISBN", "weight": 10 }],
                        "thresholds": { "high": 10, "medium": 30, "low": 5 }
                    }
                ]
            }
        }
        "#;
        assert!(load_config_from_str(config_json).is_err());
    }

    #[test]
    fn test_missing_capture_group() {
        let config_json = r#"
        {
            "version": "1.0",
            "metadata": {
                "fields": {
                    "caselaw": [{ "name": "year", "pattern": "(\\d{4})" }]
                }
            }
        }
        "#;
        assert!(matches!(
            load_config_from_str(config_json),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_template() {
        let unbalanced = r#"
        {
            "version": "1.0",
            "filename_templates": { "caselaw": { "pattern": "c.{court__{year}" } }
        }
        "#;
        assert!(load_config_from_str(unbalanced).is_err());

        let separators = r#"
        {
            "version": "1.0",
            "filename_templates": { "caselaw": { "pattern": "{court}/{year}" } }
        }
        "#;
        assert!(load_config_from_str(separators).is_err());
    }

    #[test]
    fn test_invalid_cleaning_regex() {
        let config_json = r#"
        {
            "version": "1.0",
            "cleaning_rules": { "article": { "noise_patterns": [{ "pattern": "(" }] } }
        }
        "#;
        assert!(load_config_from_str(config_json).is_err());
    }
}
