use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::schema::CleaningRules;
use crate::config::Config;
use crate::models::{DocumentType, ExtractionStrategy};

/// Runtime view of [`Config`] shared by the stages of one batch.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub registry_path: PathBuf,
    pub extensions: Vec<String>,
    pub strategy: ExtractionStrategy,
    /// Page limit for the rename stage, which only needs the opening pages.
    pub max_pages: Option<u32>,
    pub output_extension: String,
    pub modernize_spellings: bool,
    pub cleaning_rules: BTreeMap<DocumentType, CleaningRules>,
}

impl PipelineConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            registry_path: PathBuf::from(&config.registry_path),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.to_lowercase())
                .collect(),
            strategy: config.strategy,
            max_pages: config.max_pages,
            output_extension: config.output_extension.clone(),
            modernize_spellings: config.modernize_spellings,
            cleaning_rules: config.cleaning_rules.clone(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.extensions = vec!["PDF".to_string()];
        config.max_pages = Some(3);

        let pipeline = PipelineConfig::from_config(&config);
        assert_eq!(pipeline.registry_path, PathBuf::from("registry/master.db"));
        assert_eq!(pipeline.extensions, vec!["pdf"]);
        assert_eq!(pipeline.max_pages, Some(3));
        assert_eq!(pipeline.output_extension, "txt");
    }
}
