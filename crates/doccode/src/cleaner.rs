//! Text cleanup for the convert stage: normalization, per-type
//! noise/heading rules and YAML frontmatter.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde_yaml::{Mapping, Value};

use crate::codes::Code;
use crate::config::schema::CleaningRules;
use crate::models::DocumentType;

static HYPHEN_BREAK_LOWER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-\s*\n\s*([a-z])").unwrap());
static HYPHEN_BREAK_UPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-\s*\n\s*([A-Z])").unwrap());
static HYPHEN_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-\s{2,}([a-z])").unwrap());
static SPACE_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static PERIOD_CAPITAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.([A-Z])").unwrap());
static COMMA_TIGHT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",([^ \n\d])").unwrap());

static ARCHAIC_SPELLINGS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bhonour\b", "honor"),
        (r"\bhonours\b", "honors"),
        (r"\bhonourable\b", "honorable"),
        (r"\bcolour\b", "color"),
        (r"\bcolours\b", "colors"),
        (r"\blabour\b", "labor"),
        (r"\blabours\b", "labor"),
        (r"\bcentre\b", "center"),
        (r"\bcentres\b", "centers"),
        (r"\btheatre\b", "theater"),
        (r"\bmetre\b", "meter"),
        (r"\bvpon\b", "upon"),
        (r"\bvnto\b", "unto"),
        (r"\bvnder\b", "under"),
        (r"\bpublick\b", "public"),
        (r"\bmagick\b", "magic"),
        (r"\bshew\b", "show"),
        (r"\bshewed\b", "showed"),
        (r"\bgaol\b", "jail"),
        (r"\bcompl(eat|ete)", "complete"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .unwrap();
        (regex, replacement)
    })
    .collect()
});

/// Full normalization pass applied to extracted text before cleaning rules.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = to_ascii_punctuation(text);
    let text = fix_hyphens(&text);
    let text = normalize_whitespace(&text);
    let text = PERIOD_CAPITAL.replace_all(&text, ". $1");
    COMMA_TIGHT.replace_all(&text, ", $1").into_owned()
}

/// Replaces typographic punctuation with its ASCII counterpart. Other
/// characters pass through.
pub fn to_ascii_punctuation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => out.push('"'),
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{2002}' | '\u{2003}' | '\u{2009}' => {
                out.push(' ')
            }
            '\u{2022}' | '\u{00B7}' => out.push('*'),
            '\u{00AD}' | '\u{200B}' | '\u{FEFF}' => {}
            _ => out.push(c),
        }
    }
    out
}

/// Joins words split by a hyphen at a line break (`defend-\nant`).
/// Hyphens inside a line are kept.
pub fn fix_hyphens(text: &str) -> String {
    let text = HYPHEN_BREAK_LOWER.replace_all(text, "$1");
    let text = HYPHEN_BREAK_UPPER.replace_all(&text, "$1");
    HYPHEN_GAP.replace_all(&text, " $1").into_owned()
}

/// Tabs to spaces, unified line endings, no trailing spaces, single spaces
/// inside lines, at most one blank line in a row.
pub fn normalize_whitespace(text: &str) -> String {
    let text = text
        .replace('\t', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n");
    let text = text
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    let text = SPACE_RUNS.replace_all(&text, " ");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Rewrites archaic spellings found in older scanned material.
pub fn modernize_spellings(text: &str) -> String {
    let mut text = text.to_string();
    for (regex, replacement) in ARCHAIC_SPELLINGS.iter() {
        text = regex.replace_all(&text, *replacement).into_owned();
    }
    text
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanedText {
    pub text: String,
    pub lines_removed: usize,
    pub headings_added: usize,
}

/// Cleaning rules for one document type, compiled. Patterns are anchored
/// at the start of each line.
pub struct LineRules {
    noise: Vec<Regex>,
    headings: Vec<(Regex, String)>,
}

impl LineRules {
    pub fn new(rules: &CleaningRules) -> Self {
        let noise = rules
            .noise_patterns
            .iter()
            .filter_map(|p| anchored(&p.pattern))
            .collect();
        let headings = rules
            .heading_patterns
            .iter()
            .filter_map(|p| anchored(&p.pattern).map(|r| (r, p.markdown_prefix.clone())))
            .collect();
        Self { noise, headings }
    }

    pub fn empty() -> Self {
        Self {
            noise: Vec::new(),
            headings: Vec::new(),
        }
    }

    /// Drops noise lines first, then prefixes heading lines. A line gets at
    /// most one prefix.
    pub fn apply(&self, text: &str) -> CleanedText {
        let mut lines_removed = 0;
        let mut headings_added = 0;
        let mut out = Vec::new();

        for line in text.split('\n') {
            if self.noise.iter().any(|r| r.is_match(line)) {
                lines_removed += 1;
                continue;
            }
            match self.headings.iter().find(|(r, _)| r.is_match(line)) {
                Some((_, prefix)) => {
                    headings_added += 1;
                    out.push(format!("{}{}", prefix, line));
                }
                None => out.push(line.to_string()),
            }
        }

        CleanedText {
            text: out.join("\n"),
            lines_removed,
            headings_added,
        }
    }
}

fn anchored(pattern: &str) -> Option<Regex> {
    match Regex::new(&format!("^(?:{})", pattern)) {
        Ok(regex) => Some(regex),
        Err(e) => {
            log::warn!("Skipping cleaning pattern '{}': {}", pattern, e);
            None
        }
    }
}

/// Renders the `---` delimited YAML block that heads a converted file.
/// Keys come out as `type`, `source_file`, `code`, then metadata in key
/// order; metadata never overrides the first three.
pub fn render_frontmatter(
    document_type: DocumentType,
    source_file: &str,
    code: Option<&Code>,
    metadata: &BTreeMap<String, String>,
) -> Result<String, serde_yaml::Error> {
    const RESERVED: [&str; 3] = ["type", "source_file", "code"];

    let mut map = Mapping::new();
    map.insert("type".into(), document_type.as_str().into());
    map.insert("source_file".into(), source_file.into());
    if let Some(code) = code {
        map.insert("code".into(), code.as_str().into());
    }
    for (key, value) in metadata {
        if !RESERVED.contains(&key.as_str()) {
            map.insert(Value::String(key.clone()), Value::String(value.clone()));
        }
    }

    let yaml = serde_yaml::to_string(&map)?;
    Ok(format!("---\n{}---", yaml))
}
