use std::path::PathBuf;

use thiserror::Error;

use crate::codes::AllocationError;
use crate::db::DatabaseError;
use crate::error::ProcessError;
use crate::sanitize::redact_path;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File not found: {}", redact_path(.0))]
    FileNotFound(PathBuf),

    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ProcessError),

    #[error("Metadata extraction failed - no fields extracted")]
    MetadataMissing,

    #[error("Code allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    #[error("Document registration failed: {0}")]
    RegistrationFailed(#[source] DatabaseError),

    #[error("Filename formatting failed - required fields missing")]
    FormattingFailed,

    #[error("Filename collision: {0} already exists")]
    FilenameCollision(String),

    #[error("Rename operation failed for '{from}': {source}")]
    RenameFailed {
        from: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    ConvertFailed(String),

    #[error("Failed to write '{}': {source}", redact_path(.path))]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Registry error: {0}")]
    Database(#[from] DatabaseError),
}

impl PipelineError {
    /// True when the code space ran out; no later file can succeed either.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Allocation(e) if e.is_exhausted())
    }
}
