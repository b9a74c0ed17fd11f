//! Helpers for sanitizing data before it reaches logs, spans or the
//! filesystem.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

static CODE_TAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"----[A-VX-Z]{5}$").unwrap());

/// Returns only the filename component of a path (no directory).
///
/// Safe for span fields: reveals the file name without exposing the full path.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Removes characters no common filesystem accepts in a file name
/// (`< > : " / \ | ? *` and control characters), then strips leading and
/// trailing dots and spaces.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == ' ')
        .to_string()
}

/// Shortens `name` to at most `max_len` bytes.
///
/// The extension and a trailing `----CODE` on the stem survive; the text in
/// front of them is cut instead.
pub fn truncate_filename(name: &str, max_len: usize) -> String {
    if name.len() <= max_len {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    let ext_len = ext.map(|e| e.len() + 1).unwrap_or(0);

    let (body, tail) = match CODE_TAIL.find(stem) {
        Some(m) => (&stem[..m.start()], &stem[m.start()..]),
        None => (stem, ""),
    };

    let reserved = ext_len + tail.len();
    if reserved >= max_len {
        return floor_char_boundary(name, max_len).to_string();
    }

    let body = floor_char_boundary(body, max_len - reserved).trim_end_matches(['_', '-', ' ']);
    match ext {
        Some(ext) => format!("{}{}.{}", body, tail, ext),
        None => format!("{}{}", body, tail),
    }
}

fn floor_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
