//! Folder-level orchestration of the rename and convert stages.

pub mod coordinator;
pub mod result;
pub mod scanner;

pub use coordinator::{BatchCoordinator, REGISTRY_INIT_FAILED};
pub use result::{BatchOutcome, BatchResult, FailureDetail};
pub use scanner::DirectoryScanner;
