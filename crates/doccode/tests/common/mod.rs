//! Shared test utilities for doccode integration tests.
//!
//! - `TestHarness` for isolated batches with a temp input folder and registry
//! - Fake collaborators standing in for optional backends

pub mod fakes;
pub mod harness;

pub use fakes::{FakePdfExtractor, RecordingProgress};
pub use harness::{TestHarness, CASELAW_CONFIG, DOE_V_ROE, SMITH_V_JONES};
