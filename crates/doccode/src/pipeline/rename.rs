use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info_span, warn};

use crate::codes::{AllocatedCode, Code, CodeAllocator};
use crate::db::DatabaseError;
use crate::models::{
    Classification, DocumentMetadata, DocumentType, ExtractedText, ExtractionStrategy,
    ProcessingStatus,
};
use crate::registry::{path_key, Registry};
use crate::sanitize::redact_path;
use crate::services::{Collaborators, ExtractOptions};

use super::config::PipelineConfig;
use super::error::PipelineError;
use super::progress::{Phase, ProgressEvent, ProgressReporter};

pub const RENAME_STEP: &str = "rename";
pub const RENAME_STEP_ORDER: i64 = 1;

/// Where a file got to in the rename stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RenameState {
    Pending,
    TextExtracted,
    Classified,
    MetadataExtracted,
    CodeAllocated,
    Registered,
    FilenameFormatted,
    Renamed,
    Failed,
}

#[derive(Debug)]
pub struct RenameOutcome {
    /// `Renamed` on success, `Failed` otherwise.
    pub state: RenameState,
    /// Last state reached before a failure.
    pub failed_after: Option<RenameState>,
    pub old_path: PathBuf,
    pub new_path: Option<PathBuf>,
    pub new_name: Option<String>,
    pub document_type: Option<DocumentType>,
    pub code: Option<Code>,
    pub confidence: Option<f64>,
    /// Registry id of the document; `None` on a dry run for unseen files.
    pub document_id: Option<i64>,
    pub error: Option<PipelineError>,
    pub notes: Vec<String>,
}

impl RenameOutcome {
    pub fn is_success(&self) -> bool {
        self.state == RenameState::Renamed
    }

    /// The file's location after a real run. A dry run leaves the file at
    /// `old_path` and `new_path` is only the planned destination.
    pub fn current_path(&self) -> &Path {
        self.new_path.as_deref().unwrap_or(&self.old_path)
    }
}

/// Mutable state threaded through the rename steps.
struct RenameContext {
    source: PathBuf,
    state: RenameState,
    extracted: Option<ExtractedText>,
    classification: Option<Classification>,
    metadata: Option<DocumentMetadata>,
    allocated: Option<AllocatedCode>,
    document_id: Option<i64>,
    new_name: Option<String>,
    new_path: Option<PathBuf>,
    notes: Vec<String>,
}

impl RenameContext {
    fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
            state: RenameState::Pending,
            extracted: None,
            classification: None,
            metadata: None,
            allocated: None,
            document_id: None,
            new_name: None,
            new_path: None,
            notes: Vec::new(),
        }
    }

    fn document_type(&self) -> DocumentType {
        self.classification
            .as_ref()
            .map(|c| c.document_type())
            .unwrap_or(DocumentType::Unknown)
    }

    fn into_outcome(self, error: Option<PipelineError>) -> RenameOutcome {
        let (state, failed_after) = match error {
            Some(_) => (RenameState::Failed, Some(self.state)),
            None => (self.state, None),
        };
        RenameOutcome {
            state,
            failed_after,
            document_type: self.classification.as_ref().map(|c| c.document_type()),
            confidence: self.classification.as_ref().map(|c| c.confidence()),
            code: self.allocated.map(|a| a.code),
            old_path: self.source,
            new_path: self.new_path,
            new_name: self.new_name,
            document_id: self.document_id,
            error,
            notes: self.notes,
        }
    }
}

/// Extracts, classifies and names one file, registers it under a unique
/// code and renames it in place.
pub struct RenameStage {
    config: Arc<PipelineConfig>,
    services: Arc<Collaborators>,
    allocator: CodeAllocator,
}

impl RenameStage {
    pub fn new(
        config: Arc<PipelineConfig>,
        services: Arc<Collaborators>,
        allocator: CodeAllocator,
    ) -> Self {
        Self {
            config,
            services,
            allocator,
        }
    }

    fn registry(&self) -> &Registry {
        self.allocator.registry()
    }

    /// Runs every step for `path`. A dry run takes every decision but
    /// touches neither the file nor the registry.
    pub fn run(
        &self,
        path: &Path,
        strategy: ExtractionStrategy,
        dry_run: bool,
        progress: &dyn ProgressReporter,
    ) -> RenameOutcome {
        let file = redact_path(path);
        let _stage_span = info_span!("rename", file = %file, dry_run).entered();

        let source = match path.canonicalize() {
            Ok(source) => source,
            Err(_) => {
                return RenameContext::new(path)
                    .into_outcome(Some(PipelineError::FileNotFound(path.to_path_buf())))
            }
        };
        let mut ctx = RenameContext::new(&source);

        match self.run_steps(&mut ctx, &file, strategy, dry_run, progress) {
            Ok(()) => ctx.into_outcome(None),
            Err(e) => {
                debug!("Rename of {} stopped after {:?}: {}", file, ctx.state, e);
                ctx.into_outcome(Some(e))
            }
        }
    }

    fn run_steps(
        &self,
        ctx: &mut RenameContext,
        file: &str,
        strategy: ExtractionStrategy,
        dry_run: bool,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let phase = |phase: Phase, message: &str| {
            progress.report(ProgressEvent::Phase {
                file: file.to_string(),
                phase,
                message: message.to_string(),
            })
        };

        {
            let _step = info_span!("extract_text").entered();
            phase(Phase::Extracting, "Extracting text...");
            self.step_extract(ctx, strategy)?;
        }

        {
            let _step = info_span!("classify").entered();
            phase(Phase::Classifying, "Classifying document...");
            self.step_classify(ctx);
        }

        {
            let _step = info_span!("extract_metadata").entered();
            phase(Phase::ExtractingMetadata, "Extracting metadata...");
            self.step_extract_metadata(ctx)?;
        }

        {
            let _step = info_span!("allocate_code").entered();
            phase(Phase::AllocatingCode, "Allocating code...");
            self.step_allocate(ctx, dry_run)?;
        }

        {
            let _step = info_span!("register").entered();
            phase(Phase::Registering, "Registering document...");
            self.step_register(ctx, dry_run)?;
        }

        {
            let _step = info_span!("format_filename").entered();
            phase(Phase::FormattingFilename, "Formatting filename...");
            self.step_format(ctx)?;
        }

        {
            let _step = info_span!("rename_file").entered();
            phase(Phase::Renaming, "Renaming file...");
            self.step_rename(ctx, dry_run)?;
        }

        Ok(())
    }

    fn step_extract(
        &self,
        ctx: &mut RenameContext,
        strategy: ExtractionStrategy,
    ) -> Result<(), PipelineError> {
        let options = ExtractOptions {
            strategy,
            max_pages: self.config.max_pages,
        };
        ctx.extracted = Some(self.services.extractors.extract(&ctx.source, &options)?);
        ctx.state = RenameState::TextExtracted;
        Ok(())
    }

    fn step_classify(&self, ctx: &mut RenameContext) {
        let text = ctx.extracted.as_ref().map(|e| e.text.as_str()).unwrap_or("");
        let classification = self.services.classifier.classify(text);
        debug!(
            "Classified as {} ({:.2})",
            classification.document_type(),
            classification.confidence()
        );
        ctx.classification = Some(classification);
        ctx.state = RenameState::Classified;
    }

    fn step_extract_metadata(&self, ctx: &mut RenameContext) -> Result<(), PipelineError> {
        let text = ctx.extracted.as_ref().map(|e| e.text.as_str()).unwrap_or("");
        let metadata = self
            .services
            .metadata
            .extract_metadata(ctx.document_type(), text);
        if metadata.is_empty() {
            return Err(PipelineError::MetadataMissing);
        }
        debug!("Extracted {} metadata fields", metadata.len());
        ctx.metadata = Some(metadata);
        ctx.state = RenameState::MetadataExtracted;
        Ok(())
    }

    fn step_allocate(&self, ctx: &mut RenameContext, dry_run: bool) -> Result<(), PipelineError> {
        let allocated = if dry_run {
            self.allocator.preview_code_for_file(&ctx.source)?
        } else {
            self.allocator.allocate_code_for_file(&ctx.source)?
        };
        ctx.allocated = Some(allocated);
        ctx.state = RenameState::CodeAllocated;
        Ok(())
    }

    /// Links the code to the document. On failure a fresh code is released
    /// again; the counter keeps its value.
    fn step_register(&self, ctx: &mut RenameContext, dry_run: bool) -> Result<(), PipelineError> {
        let Some(allocated) = ctx.allocated.clone() else {
            return Ok(());
        };

        let registered = if dry_run {
            self.find_reusable_document(&ctx.source, &allocated.code)
        } else {
            self.register(ctx, &allocated.code).map(Some)
        };

        match registered {
            Ok(document_id) => {
                ctx.document_id = document_id;
                ctx.state = RenameState::Registered;
                Ok(())
            }
            Err(e) => {
                if !dry_run && allocated.is_fresh() {
                    if let Err(rollback) = self.allocator.rollback_code(&allocated.code) {
                        warn!("Failed to roll back code {}: {}", allocated.code, rollback);
                    }
                }
                Err(PipelineError::RegistrationFailed(e))
            }
        }
    }

    fn register(&self, ctx: &RenameContext, code: &Code) -> Result<i64, DatabaseError> {
        let registry = self.registry();
        let document_type = ctx.document_type();

        let document_id = match self.find_reusable_document(&ctx.source, code)? {
            Some(id) => {
                registry.update_document_type(id, document_type)?;
                id
            }
            None => registry.register_document(&ctx.source, Some(document_type))?,
        };
        registry.commit_code_to_document(code, document_id)?;
        if let Some(metadata) = &ctx.metadata {
            registry.add_document_metadata(document_id, metadata)?;
        }
        Ok(document_id)
    }

    /// An existing row for `path` is reused when it carries no code yet or
    /// already carries `code`. Any other code is a conflict.
    fn find_reusable_document(&self, path: &Path, code: &Code) -> Result<Option<i64>, DatabaseError> {
        match self.registry().get_document_by_path(path)? {
            None => Ok(None),
            Some(row) => match &row.unique_code {
                None => Ok(Some(row.id)),
                Some(existing) if existing == code => Ok(Some(row.id)),
                Some(_) => Err(DatabaseError::DuplicatePath(path_key(path))),
            },
        }
    }

    fn step_format(&self, ctx: &mut RenameContext) -> Result<(), PipelineError> {
        let code = ctx
            .allocated
            .as_ref()
            .map(|a| &a.code)
            .ok_or(PipelineError::FormattingFailed)?;
        let fields = ctx
            .metadata
            .as_ref()
            .map(|m| m.values())
            .unwrap_or_default();
        let extension = ctx
            .source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");

        let new_name = self
            .services
            .formatter
            .format_filename(ctx.document_type(), &fields, code, extension)
            .ok_or(PipelineError::FormattingFailed)?;
        let new_path = ctx.source.with_file_name(&new_name);

        if new_path != ctx.source && new_path.exists() {
            return Err(PipelineError::FilenameCollision(new_name));
        }

        ctx.new_name = Some(new_name);
        ctx.new_path = Some(new_path);
        ctx.state = RenameState::FilenameFormatted;
        Ok(())
    }

    fn step_rename(&self, ctx: &mut RenameContext, dry_run: bool) -> Result<(), PipelineError> {
        let Some(new_path) = ctx.new_path.clone() else {
            return Err(PipelineError::FormattingFailed);
        };
        let from = redact_path(&ctx.source);
        let to = redact_path(&new_path);

        if dry_run {
            ctx.notes.push(format!("Dry run: would rename {} to {}", from, to));
            ctx.state = RenameState::Renamed;
            return Ok(());
        }

        if new_path != ctx.source {
            std::fs::rename(&ctx.source, &new_path)
                .map_err(|source| PipelineError::RenameFailed { from, source })?;
        }
        ctx.state = RenameState::Renamed;

        // The file has moved; from here on registry trouble is only noted.
        let Some(document_id) = ctx.document_id else {
            return Ok(());
        };
        let registry = self.registry();
        if let Err(e) = registry.update_document_path(document_id, &new_path) {
            warn!("Renamed {} but the registry still points at the old path: {}", to, e);
            ctx.notes
                .push(format!("Registry path update failed for {}: {}", to, e));
            return Ok(());
        }
        if let Err(e) = registry.record_processing_step(
            document_id,
            RENAME_STEP,
            RENAME_STEP_ORDER,
            ProcessingStatus::Success,
            None,
        ) {
            warn!("Failed to record rename step for {}: {}", to, e);
            ctx.notes.push(format!("Rename step not recorded: {}", e));
        }
        Ok(())
    }
}
