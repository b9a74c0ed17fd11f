use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info_span, warn};

use crate::cleaner::{self, CleanedText, LineRules};
use crate::codes::Code;
use crate::models::{DocumentType, ExtractionStrategy, ProcessingStatus};
use crate::registry::Registry;
use crate::sanitize::redact_path;
use crate::services::{Collaborators, ExtractOptions};

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::progress::{Phase, ProgressEvent, ProgressReporter};

pub const CONVERT_STEP: &str = "convert";
pub const CONVERT_STEP_ORDER: i64 = 2;

#[derive(Debug)]
pub struct ConvertOutcome {
    pub source_path: PathBuf,
    pub output_path: Option<PathBuf>,
    pub document_type: Option<DocumentType>,
    /// Characters in the cleaned body, frontmatter excluded.
    pub char_count: usize,
    pub lines_removed: usize,
    pub headings_added: usize,
    pub elapsed: Duration,
    pub error: Option<PipelineError>,
}

impl ConvertOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Turns a renamed document into a cleaned text file with a YAML
/// frontmatter header, written next to the source.
pub struct ConvertStage {
    config: Arc<PipelineConfig>,
    services: Arc<Collaborators>,
    registry: Registry,
    rules: BTreeMap<DocumentType, LineRules>,
}

impl ConvertStage {
    pub fn new(config: Arc<PipelineConfig>, services: Arc<Collaborators>, registry: Registry) -> Self {
        let rules = config
            .cleaning_rules
            .iter()
            .map(|(document_type, rules)| (*document_type, LineRules::new(rules)))
            .collect();
        Self {
            config,
            services,
            registry,
            rules,
        }
    }

    /// Converts `path`. `code` takes precedence over the code the registry
    /// holds for the path. A dry run builds the output but writes nothing.
    pub fn run(
        &self,
        path: &Path,
        code: Option<&Code>,
        strategy: ExtractionStrategy,
        dry_run: bool,
        progress: &dyn ProgressReporter,
    ) -> ConvertOutcome {
        let started = Instant::now();
        let file = redact_path(path);
        let _stage_span = info_span!("convert", file = %file, dry_run).entered();

        let mut outcome = ConvertOutcome {
            source_path: path.to_path_buf(),
            output_path: None,
            document_type: None,
            char_count: 0,
            lines_removed: 0,
            headings_added: 0,
            elapsed: Duration::ZERO,
            error: None,
        };

        if let Err(e) = self.run_steps(&mut outcome, &file, code, strategy, dry_run, progress) {
            debug!("Conversion of {} failed: {}", file, e);
            outcome.error = Some(e);
        }
        outcome.elapsed = started.elapsed();
        outcome
    }

    fn run_steps(
        &self,
        outcome: &mut ConvertOutcome,
        file: &str,
        code: Option<&Code>,
        strategy: ExtractionStrategy,
        dry_run: bool,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let path = outcome.source_path.clone();
        let phase = |phase: Phase, message: &str| {
            progress.report(ProgressEvent::Phase {
                file: file.to_string(),
                phase,
                message: message.to_string(),
            })
        };

        let extracted = {
            let _step = info_span!("extract_text").entered();
            phase(Phase::Extracting, "Extracting full text...");
            self.services
                .extractors
                .extract(&path, &ExtractOptions::new(strategy))?
        };

        let document_type = {
            let _step = info_span!("classify").entered();
            phase(Phase::Classifying, "Classifying document...");
            self.services.classifier.classify(&extracted.text).document_type()
        };
        outcome.document_type = Some(document_type);

        let cleaned = {
            let _step = info_span!("clean_text").entered();
            phase(Phase::Cleaning, "Cleaning text...");
            self.clean(document_type, &extracted.text)
        };
        outcome.char_count = cleaned.text.chars().count();
        outcome.lines_removed = cleaned.lines_removed;
        outcome.headings_added = cleaned.headings_added;

        let _step = info_span!("write_output").entered();
        phase(Phase::WritingOutput, "Writing output...");

        let output_path = path.with_extension(&self.config.output_extension);
        if output_path == path {
            return Err(PipelineError::ConvertFailed(format!(
                "Output would overwrite the source file {}",
                file
            )));
        }

        let document = self.registry.get_document_by_path(&path)?;
        let stored_code = document.as_ref().and_then(|d| d.unique_code.clone());
        let fields: BTreeMap<String, String> = match &document {
            // Later rows win, so a re-run's metadata replaces the first run's.
            Some(row) => self
                .registry
                .get_metadata(row.id)?
                .into_iter()
                .map(|field| (field.key, field.value))
                .collect(),
            None => BTreeMap::new(),
        };

        let frontmatter = cleaner::render_frontmatter(
            document_type,
            file,
            code.or(stored_code.as_ref()),
            &fields,
        )
        .map_err(|e| PipelineError::ConvertFailed(format!("Frontmatter rendering failed: {}", e)))?;
        let content = format!("{}\n\n{}", frontmatter, cleaned.text);

        if dry_run {
            debug!("Dry run: would write {}", redact_path(&output_path));
            outcome.output_path = Some(output_path);
            return Ok(());
        }

        std::fs::write(&output_path, content).map_err(|source| PipelineError::WriteOutput {
            path: output_path.clone(),
            source,
        })?;
        outcome.output_path = Some(output_path);

        if let Some(row) = document {
            if let Err(e) = self.registry.record_processing_step(
                row.id,
                CONVERT_STEP,
                CONVERT_STEP_ORDER,
                ProcessingStatus::Success,
                None,
            ) {
                warn!("Failed to record convert step for {}: {}", file, e);
            }
        }
        Ok(())
    }

    fn clean(&self, document_type: DocumentType, text: &str) -> CleanedText {
        let mut normalized = cleaner::normalize_text(text);
        if self.config.modernize_spellings {
            normalized = cleaner::modernize_spellings(&normalized);
        }
        match self.rules.get(&document_type) {
            Some(rules) => rules.apply(&normalized),
            None => CleanedText {
                text: normalized,
                lines_removed: 0,
                headings_added: 0,
            },
        }
    }
}
