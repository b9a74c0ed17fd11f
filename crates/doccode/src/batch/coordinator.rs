use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{error, info, warn};
use tracing::info_span;
use uuid::Uuid;

use crate::codes::CodeAllocator;
use crate::config::Config;
use crate::models::ExtractionStrategy;
use crate::pipeline::{
    ConvertStage, LogProgress, PipelineConfig, ProgressEvent, ProgressReporter, RenameStage,
};
use crate::registry::Registry;
use crate::sanitize::redact_path;
use crate::services::Collaborators;

use super::result::BatchResult;
use super::scanner::DirectoryScanner;

pub const REGISTRY_INIT_FAILED: &str = "Registry initialization failed";

/// Closes the batch's registry handle however the batch ends.
struct CloseOnDrop(Registry);

impl Drop for CloseOnDrop {
    fn drop(&mut self) {
        if let Err(e) = self.0.close() {
            warn!("Failed to close registry: {}", e);
        }
    }
}

/// Runs rename then convert over every file of a folder, one file at a
/// time, against a single registry connection.
pub struct BatchCoordinator {
    config: Arc<PipelineConfig>,
    services: Arc<Collaborators>,
    progress: Arc<dyn ProgressReporter>,
    cancelled: Arc<AtomicBool>,
}

impl BatchCoordinator {
    pub fn new(config: Arc<PipelineConfig>, services: Arc<Collaborators>) -> Self {
        Self {
            config,
            services,
            progress: Arc::new(LogProgress),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Production constructor: rule-driven collaborators built from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(PipelineConfig::from_config(config)),
            Arc::new(Collaborators::from_config(config)),
        )
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Requests a stop. The file in flight finishes; the rest are skipped.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Shared flag for cancelling from another thread.
    pub fn cancellation_token(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn process_batch(
        &self,
        folder: &Path,
        strategy: ExtractionStrategy,
        dry_run: bool,
    ) -> BatchResult {
        let timer = Instant::now();
        let mut result = BatchResult::new(Uuid::new_v4().to_string());
        let _batch_span = info_span!("batch",
            batch_id = %result.batch_id,
            folder = %redact_path(folder),
            dry_run,
        )
        .entered();

        let scanner = DirectoryScanner::new(folder, &self.config.extensions);
        if !folder.is_dir() {
            warn!("Batch folder {} does not exist", folder.display());
            result
                .warnings
                .push(format!("Folder not found: {}", folder.display()));
            return result.finish(timer);
        }

        let files = scanner.scan();
        if files.is_empty() {
            let warning = scanner.empty_folder_warning();
            warn!("{}: {}", warning, folder.display());
            result.warnings.push(warning);
            return result.finish(timer);
        }
        result.total = files.len();
        self.progress
            .report(ProgressEvent::BatchStarted { total: files.len() });

        let registry = match Registry::open(&self.config.registry_path) {
            Ok(registry) => registry,
            Err(e) => {
                error!("{}: {}", REGISTRY_INIT_FAILED, e);
                result.warnings.push(format!("{}: {}", REGISTRY_INIT_FAILED, e));
                for path in &files {
                    result.record_failure(redact_path(path), REGISTRY_INIT_FAILED);
                }
                self.report_completed(&result);
                return result.finish(timer);
            }
        };
        let _close = CloseOnDrop(registry.clone());

        let rename = RenameStage::new(
            Arc::clone(&self.config),
            Arc::clone(&self.services),
            CodeAllocator::new(registry.clone()),
        );
        let convert = ConvertStage::new(
            Arc::clone(&self.config),
            Arc::clone(&self.services),
            registry,
        );
        let progress = self.progress.as_ref();

        for (index, path) in files.iter().enumerate() {
            if self.is_cancelled() {
                result.skipped = files.len() - index;
                let warning = format!("Batch cancelled; {} files skipped", result.skipped);
                warn!("{}", warning);
                result.warnings.push(warning);
                break;
            }

            let file = redact_path(path);
            progress.report(ProgressEvent::FileStarted {
                index,
                total: files.len(),
                file: file.clone(),
            });

            let renamed = rename.run(path, strategy, dry_run, progress);
            if let Some(e) = &renamed.error {
                let reason = format!("Rename failed: {}", e);
                progress.report(ProgressEvent::FileFailed {
                    file: file.clone(),
                    error: reason.clone(),
                });
                result.record_failure(file, reason);

                if e.is_exhausted() {
                    let remaining = &files[index + 1..];
                    let warning = format!(
                        "Code space exhausted; {} remaining files not processed",
                        remaining.len()
                    );
                    error!("{}", warning);
                    for rest in remaining {
                        result.record_failure(redact_path(rest), format!("Rename failed: {}", e));
                    }
                    result.warnings.push(warning);
                    break;
                }
                continue;
            }

            if dry_run {
                for note in &renamed.notes {
                    info!("{}", note);
                }
            } else {
                result.warnings.extend(renamed.notes.iter().cloned());
            }

            let new_name = renamed.new_name.clone().unwrap_or_else(|| file.clone());
            // A dry run only planned the move; the file is still at its old path.
            let source = if dry_run {
                renamed.old_path.as_path()
            } else {
                renamed.current_path()
            };
            let converted = convert.run(
                source,
                renamed.code.as_ref(),
                strategy,
                dry_run,
                progress,
            );
            if let Some(e) = &converted.error {
                let reason = format!("Convert failed: {}", e);
                progress.report(ProgressEvent::FileFailed {
                    file: new_name.clone(),
                    error: reason.clone(),
                });
                result.record_failure(new_name, reason);
                continue;
            }

            result.successful += 1;
            progress.report(ProgressEvent::FileCompleted {
                file,
                new_name,
                code: renamed
                    .code
                    .as_ref()
                    .map(|c| c.to_string())
                    .unwrap_or_default(),
            });
        }

        self.report_completed(&result);
        info!(
            "Batch {}: {} succeeded, {} failed, {} skipped",
            result.batch_id, result.successful, result.failed, result.skipped
        );
        result.finish(timer)
    }

    fn report_completed(&self, result: &BatchResult) {
        self.progress.report(ProgressEvent::BatchCompleted {
            successful: result.successful,
            failed: result.failed,
            skipped: result.skipped,
        });
    }
}
