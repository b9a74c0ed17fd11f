use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A file that did not make it through the batch, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    FullSuccess,
    PartialSuccess,
    TotalFailure,
    /// Nothing was processed: no files, or every file skipped.
    Empty,
}

/// Summary of one `process_batch` call.
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub batch_id: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
    pub warnings: Vec<String>,
    pub failure_details: Vec<FailureDetail>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: f64,
}

impl BatchResult {
    pub(crate) fn new(batch_id: String) -> Self {
        let now = Utc::now();
        Self {
            batch_id,
            total: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
            warnings: Vec::new(),
            failure_details: Vec::new(),
            started_at: now,
            completed_at: now,
            duration_seconds: 0.0,
        }
    }

    pub(crate) fn record_failure(&mut self, file: impl Into<String>, reason: impl Into<String>) {
        self.failed += 1;
        self.failure_details.push(FailureDetail {
            file: file.into(),
            reason: reason.into(),
        });
    }

    pub(crate) fn finish(mut self, timer: Instant) -> Self {
        self.completed_at = Utc::now();
        self.duration_seconds = timer.elapsed().as_secs_f64();
        self
    }

    /// Fraction of processed files that succeeded; skipped files do not count.
    pub fn success_rate(&self) -> f64 {
        let processed = self.successful + self.failed;
        if processed == 0 {
            0.0
        } else {
            self.successful as f64 / processed as f64
        }
    }

    pub fn outcome(&self) -> BatchOutcome {
        match (self.successful, self.failed) {
            (0, 0) => BatchOutcome::Empty,
            (_, 0) => BatchOutcome::FullSuccess,
            (0, _) => BatchOutcome::TotalFailure,
            _ => BatchOutcome::PartialSuccess,
        }
    }
}
