//! Test harness for isolated batch runs.
//!
//! Each `TestHarness` owns a temp directory holding an input folder, a
//! config file and the registry database.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use doccode::batch::{BatchCoordinator, BatchResult};
use doccode::config::{load_config, Config};
use doccode::models::ExtractionStrategy;
use doccode::pipeline::{NoopProgress, PipelineConfig, ProgressReporter};
use doccode::registry::Registry;
use doccode::services::Collaborators;

use super::fakes::FakePdfExtractor;

/// Case-law rules used across the integration tests.
pub const CASELAW_CONFIG: &str = r#"
version: "1.0"
extensions: [pdf, docx]
output_extension: txt
classification:
  rules:
    - document_type: caselaw
      patterns:
        - { pattern: '\bv\.\s', weight: 30, description: "case caption" }
        - { pattern: '\bCourt of Appeals\b', weight: 40 }
        - { pattern: '\bOPINION\b', weight: 20, case_sensitive: true }
metadata:
  fields:
    caselaw:
      - name: court
        pattern: '(?P<court>Georgia Court of Appeals|Supreme Court of Georgia)'
        transform: abbreviate
      - name: year
        pattern: 'Decided\s+\w+\s+\d{1,2},\s+(?P<year>\d{4})'
      - name: case_name
        pattern: '(?m)^(?P<case_name>[A-Z][\w.]* v\. [A-Z][\w.]*)'
      - name: citation
        pattern: '(?P<citation>\d+ Ga\. App\. \d+)'
  abbreviations:
    courts:
      Georgia Court of Appeals: "Ga. Ct. App."
      Supreme Court of Georgia: "Ga."
filename_templates:
  caselaw:
    pattern: 'c.{court}__{year}__{case_name}__{citation}'
    fields:
      court: { style: underscore }
      year: {}
      case_name: { style: hyphen }
      citation: { style: underscore }
cleaning_rules:
  caselaw:
    noise_patterns:
      - pattern: 'Page \d+ of \d+'
    heading_patterns:
      - pattern: 'OPINION'
        markdown_prefix: '# '
"#;

pub const SMITH_V_JONES: &str = "Georgia Court of Appeals\n\nSmith v. Jones\n\n328 Ga. App. 524\n\nDecided March 3, 2014\n\nOPINION\n\nThe trial court erred.\nPage 1 of 2\n";

pub const DOE_V_ROE: &str = "Supreme Court of Georgia\n\nDoe v. Roe\n\n330 Ga. App. 101\n\nDecided June 1, 2015\n\nOPINION\n\nAffirmed.\n";

pub struct TestHarness {
    temp_dir: TempDir,
    pub input_dir: PathBuf,
    pub registry_path: PathBuf,
    pub config: Config,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let input_dir = temp_dir.path().join("input");
        std::fs::create_dir_all(&input_dir).expect("Failed to create input dir");

        let config_path = temp_dir.path().join("doccode.yaml");
        std::fs::write(&config_path, CASELAW_CONFIG).expect("Failed to write config");
        let mut config = load_config(&config_path).expect("Failed to load config");

        let registry_path = temp_dir.path().join("registry").join("master.db");
        config.registry_path = registry_path.to_string_lossy().into_owned();

        Self {
            temp_dir,
            input_dir,
            registry_path,
            config,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_input(&self, filename: &str, content: &str) -> PathBuf {
        let path = self.input_dir.join(filename);
        std::fs::write(&path, content).expect("Failed to write input file");
        path
    }

    pub fn collaborators(&self) -> Collaborators {
        let mut collaborators = Collaborators::from_config(&self.config);
        collaborators.extractors.register(Box::new(FakePdfExtractor));
        collaborators
    }

    pub fn coordinator(&self) -> BatchCoordinator {
        self.coordinator_with_progress(Arc::new(NoopProgress))
    }

    pub fn coordinator_with_progress(&self, progress: Arc<dyn ProgressReporter>) -> BatchCoordinator {
        BatchCoordinator::new(
            Arc::new(PipelineConfig::from_config(&self.config)),
            Arc::new(self.collaborators()),
        )
        .with_progress(progress)
    }

    pub fn run(&self, dry_run: bool) -> BatchResult {
        self.coordinator()
            .process_batch(&self.input_dir, ExtractionStrategy::Fast, dry_run)
    }

    pub fn open_registry(&self) -> Registry {
        Registry::open(&self.registry_path).expect("Failed to open registry")
    }

    /// File names in the input folder, sorted.
    pub fn input_names(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.input_dir)
            .expect("Failed to read input dir")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}
