use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::codes::{Code, SEPARATOR};
use crate::config::schema::{FieldFormat, FieldStyle, FilenameTemplate};
use crate::models::DocumentType;
use crate::sanitize::{sanitize_filename, truncate_filename};
use crate::services::FilenameFormatter;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").unwrap());
static NOT_UNDERSCORE_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").unwrap());
static NOT_HYPHEN_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\-]").unwrap());
static UNDERSCORES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());
static HYPHENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());

const CODE_PLACEHOLDER: &str = "code";

/// Renders file names from per-type templates such as
/// `c.{court}__{year}__{case_name}__{citation}`.
pub struct TemplateFilenameFormatter {
    templates: BTreeMap<DocumentType, FilenameTemplate>,
}

impl TemplateFilenameFormatter {
    pub fn new(templates: BTreeMap<DocumentType, FilenameTemplate>) -> Self {
        Self { templates }
    }

    pub fn has_template(&self, document_type: DocumentType) -> bool {
        self.templates.contains_key(&document_type)
    }
}

impl FilenameFormatter for TemplateFilenameFormatter {
    fn format_filename(
        &self,
        document_type: DocumentType,
        fields: &BTreeMap<String, String>,
        code: &Code,
        extension: &str,
    ) -> Option<String> {
        let Some(template) = self.templates.get(&document_type) else {
            log::debug!("No filename template for {}", document_type);
            return None;
        };

        let mut rendered = String::with_capacity(template.pattern.len() + 32);
        let mut last = 0;
        let mut has_code = false;
        for caps in PLACEHOLDER.captures_iter(&template.pattern) {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str();
            rendered.push_str(&template.pattern[last..whole.start()]);
            last = whole.end();

            if name == CODE_PLACEHOLDER {
                rendered.push_str(code.as_str());
                has_code = true;
                continue;
            }

            let raw = fields.get(name).map(|v| v.trim()).filter(|v| !v.is_empty());
            let value = match (raw, template.fields.get(name)) {
                (Some(raw), Some(format)) => {
                    let styled = apply_style(raw, format.style);
                    if styled.is_empty() {
                        format.fallback.clone().unwrap_or_default()
                    } else {
                        styled
                    }
                }
                (Some(raw), None) => raw.to_string(),
                (None, Some(FieldFormat { required: true, .. })) | (None, None) => {
                    log::debug!("Missing required field '{}' for {} filename", name, document_type);
                    return None;
                }
                (None, Some(format)) => format.fallback.clone().unwrap_or_default(),
            };
            rendered.push_str(&value);
        }
        rendered.push_str(&template.pattern[last..]);

        // Required fields the pattern does not reference still gate formatting.
        let missing_required = template.fields.iter().any(|(name, format)| {
            format.required && fields.get(name).map_or(true, |v| v.trim().is_empty())
        });
        if missing_required {
            return None;
        }

        if !has_code {
            rendered.push_str(SEPARATOR);
            rendered.push_str(code.as_str());
        }

        let extension = extension.trim_start_matches('.');
        if !extension.is_empty() {
            rendered.push('.');
            rendered.push_str(extension);
        }

        let name = truncate_filename(&sanitize_filename(&rendered), template.max_length);
        (!name.is_empty()).then_some(name)
    }
}

/// Applies a field style. `Underscore` drops periods and joins words with
/// `_`; `Hyphen` turns `&` into `and`, drops periods and commas and joins
/// words with `-`. Both keep only ASCII letters, digits and the joiner.
pub fn apply_style(value: &str, style: FieldStyle) -> String {
    match style {
        FieldStyle::Keep => value.to_string(),
        FieldStyle::Underscore => {
            let joined = value.replace('.', "").replace(' ', "_");
            let kept = NOT_UNDERSCORE_WORD.replace_all(&joined, "");
            UNDERSCORES.replace_all(&kept, "_").trim_matches('_').to_string()
        }
        FieldStyle::Hyphen => {
            let joined = value
                .replace('&', "and")
                .replace(['.', ','], "")
                .replace(' ', "-");
            let kept = NOT_HYPHEN_WORD.replace_all(&joined, "");
            HYPHENS.replace_all(&kept, "-").trim_matches('-').to_string()
        }
    }
}
