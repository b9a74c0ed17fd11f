pub mod batch;
pub mod cleaner;
pub mod codes;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod registry;
pub mod sanitize;
pub mod services;

pub use batch::{BatchCoordinator, BatchOutcome, BatchResult, FailureDetail};
pub use codes::{AllocationError, Code, CodeAllocator, CodeError};
pub use config::{load_config, Config};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, DoccodeError, ProcessError, Result};
pub use models::{DocumentType, ExtractionStrategy};
pub use pipeline::{
    ConvertStage, LogProgress, NoopProgress, PipelineConfig, PipelineError, ProgressEvent,
    ProgressReporter, RenameStage,
};
pub use registry::Registry;
pub use services::{
    Classifier, Collaborators, DocumentFormat, ExtractorRegistry, FilenameFormatter,
    MetadataExtractor, TextExtractor,
};
