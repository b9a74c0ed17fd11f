use std::path::PathBuf;
use thiserror::Error;

use crate::sanitize::redact_path;

#[derive(Error, Debug)]
pub enum DoccodeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Processing error: {0}")]
    Process(#[from] ProcessError),

    #[error("Code error: {0}")]
    Code(#[from] crate::codes::CodeError),

    #[error("Allocation error: {0}")]
    Allocation(#[from] crate::codes::AllocationError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Failed to parse config YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid metadata pattern '{name}': {reason}")]
    InvalidPattern { name: String, reason: String },

    #[error("Invalid rule '{id}': {reason}")]
    InvalidRule { id: String, reason: String },
}

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read document '{}': {source}", redact_path(.path))]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No text extracted from {0}")]
    EmptyText(String),

    #[error("Text extraction failed: {0}")]
    TextExtraction(String),
}

pub type Result<T> = std::result::Result<T, DoccodeError>;
