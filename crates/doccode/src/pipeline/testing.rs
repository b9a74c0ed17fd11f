//! Fixtures shared by the stage tests.

use std::path::{Path, PathBuf};

use crate::config::{load_config_from_str, Config};
use crate::services::Collaborators;

use super::config::PipelineConfig;

pub const STATUTE_TEXT: &str = "Title 12\nSection 34\nThe code applies to all counties.\nPage 1\n";

pub fn statute_config() -> Config {
    load_config_from_str(
        r#"{
            "version": "1.0",
            "extensions": ["txt"],
            "output_extension": "md",
            "classification": {
                "rules": [{
                    "document_type": "statute",
                    "patterns": [
                        { "pattern": "\\bSection\\s+\\d+", "weight": 40 },
                        { "pattern": "\\bcode\\b", "weight": 30 }
                    ]
                }]
            },
            "metadata": {
                "fields": {
                    "statute": [
                        { "name": "title", "pattern": "Title\\s+(?P<title>\\d+)" },
                        { "name": "section", "pattern": "Section\\s+(?P<section>\\d+)" }
                    ]
                }
            },
            "filename_templates": {
                "statute": {
                    "pattern": "s.T{title}_S{section}",
                    "fields": { "title": {}, "section": {} }
                }
            },
            "cleaning_rules": {
                "statute": {
                    "noise_patterns": [{ "pattern": "Page \\d+" }],
                    "heading_patterns": [{ "pattern": "Section \\d+" }]
                }
            }
        }"#,
    )
    .unwrap()
}

pub fn pipeline_config() -> PipelineConfig {
    PipelineConfig::from_config(&statute_config())
}

pub fn collaborators() -> Collaborators {
    Collaborators::from_config(&statute_config())
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path.canonicalize().unwrap()
}
