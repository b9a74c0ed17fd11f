/// Phases a file passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Extracting,
    Classifying,
    ExtractingMetadata,
    AllocatingCode,
    Registering,
    FormattingFilename,
    Renaming,
    Cleaning,
    WritingOutput,
}

/// Events emitted while a batch runs.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    BatchStarted {
        total: usize,
    },
    FileStarted {
        index: usize,
        total: usize,
        file: String,
    },
    Phase {
        file: String,
        phase: Phase,
        message: String,
    },
    FileCompleted {
        file: String,
        new_name: String,
        code: String,
    },
    FileFailed {
        file: String,
        error: String,
    },
    BatchCompleted {
        successful: usize,
        failed: usize,
        skipped: usize,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes events to the `log` facade.
pub struct LogProgress;

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::BatchStarted { total } => log::info!("Processing {} files", total),
            ProgressEvent::FileStarted { index, total, file } => {
                log::info!("[{}/{}] {}", index + 1, total, file)
            }
            ProgressEvent::Phase { file, phase, message } => {
                log::debug!("{} {:?}: {}", file, phase, message)
            }
            ProgressEvent::FileCompleted { file, new_name, code } => {
                log::info!("{} -> {} ({})", file, new_name, code)
            }
            ProgressEvent::FileFailed { file, error } => log::warn!("{} failed: {}", file, error),
            ProgressEvent::BatchCompleted {
                successful,
                failed,
                skipped,
            } => log::info!(
                "Batch finished: {} succeeded, {} failed, {} skipped",
                successful,
                failed,
                skipped
            ),
        }
    }
}
