use std::path::Path;

use crate::error::ProcessError;
use crate::models::{ExtractedText, ExtractionStrategy};
use crate::sanitize::redact_path;
use crate::services::{DocumentFormat, ExtractOptions, TextExtractor};

const PAGE_BREAK: char = '\u{0c}';

/// Reads `.txt` and `.md` files. Form feeds count as page breaks.
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path, options: &ExtractOptions) -> Result<ExtractedText, ProcessError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ProcessError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;

        let pages: Vec<&str> = raw.split(PAGE_BREAK).collect();
        let page_count = pages.len() as u32;
        let text = match options.max_pages {
            Some(max) if (max as usize) < pages.len() => pages[..max as usize].join("\n"),
            _ => raw.replace(PAGE_BREAK, "\n"),
        };

        Ok(ExtractedText {
            text,
            page_count: Some(page_count),
        })
    }

    fn supports(&self, format: DocumentFormat, _strategy: ExtractionStrategy) -> bool {
        matches!(format, DocumentFormat::Text)
    }
}

/// Picks the first registered extractor able to handle a file.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    /// Registry with only the plain-text extractor.
    pub fn new() -> Self {
        Self {
            extractors: vec![Box::new(PlainTextExtractor::new())],
        }
    }

    pub fn empty() -> Self {
        Self { extractors: Vec::new() }
    }

    /// Adds a backend. Earlier registrations take precedence.
    pub fn register(&mut self, extractor: Box<dyn TextExtractor>) {
        self.extractors.push(extractor);
    }

    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.register(extractor);
        self
    }

    pub fn supports(&self, format: DocumentFormat, strategy: ExtractionStrategy) -> bool {
        self.extractors.iter().any(|e| e.supports(format, strategy))
    }

    /// Extracts text from `path`.
    ///
    /// Fails with `UnsupportedFormat` when no backend handles the file's
    /// format under the requested strategy, and with `EmptyText` when the
    /// backend returns only whitespace.
    pub fn extract(&self, path: &Path, options: &ExtractOptions) -> Result<ExtractedText, ProcessError> {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let format = DocumentFormat::from_extension(extension)
            .ok_or_else(|| ProcessError::UnsupportedFormat(extension.to_string()))?;

        let extractor = self
            .extractors
            .iter()
            .find(|e| e.supports(format, options.strategy))
            .ok_or_else(|| ProcessError::UnsupportedFormat(extension.to_string()))?;

        let extracted = extractor.extract(path, options)?;
        if extracted.text.trim().is_empty() {
            return Err(ProcessError::EmptyText(redact_path(path)));
        }

        log::debug!(
            "Extracted {} chars from {} ({:?} strategy)",
            extracted.text.len(),
            redact_path(path),
            options.strategy
        );
        Ok(extracted)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
