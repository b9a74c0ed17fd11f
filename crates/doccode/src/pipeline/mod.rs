//! Per-file processing: the rename stage followed by the convert stage.

pub mod config;
pub mod convert;
pub mod error;
pub mod progress;
pub mod rename;

#[cfg(test)]
pub(crate) mod testing;

pub use config::PipelineConfig;
pub use convert::{ConvertOutcome, ConvertStage};
pub use error::PipelineError;
pub use progress::{LogProgress, NoopProgress, Phase, ProgressEvent, ProgressReporter};
pub use rename::{RenameOutcome, RenameStage, RenameState};
