//! Test doubles for the collaborator traits.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use doccode::error::ProcessError;
use doccode::models::{ExtractedText, ExtractionStrategy};
use doccode::pipeline::{ProgressEvent, ProgressReporter};
use doccode::services::{DocumentFormat, ExtractOptions, TextExtractor};

/// Treats `.pdf` files as plain text so fixtures stay readable.
pub struct FakePdfExtractor;

impl TextExtractor for FakePdfExtractor {
    fn extract(&self, path: &Path, _options: &ExtractOptions) -> Result<ExtractedText, ProcessError> {
        let text = std::fs::read_to_string(path).map_err(|source| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ExtractedText {
            text,
            page_count: Some(1),
        })
    }

    fn supports(&self, format: DocumentFormat, _strategy: ExtractionStrategy) -> bool {
        format == DocumentFormat::Pdf
    }
}

/// Records every event; optionally cancels the batch after the first
/// completed file.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
    cancel_after_first: Option<Arc<AtomicBool>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancelling(token: Arc<AtomicBool>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            cancel_after_first: Some(token),
        }
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        if let (ProgressEvent::FileCompleted { .. }, Some(token)) = (&event, &self.cancel_after_first) {
            token.store(true, Ordering::Release);
        }
        self.events.lock().unwrap().push(event);
    }
}
