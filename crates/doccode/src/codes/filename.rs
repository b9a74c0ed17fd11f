//! Reading and writing the `----CODE` suffix in file names.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::Code;

/// Separator between the descriptive part of a file name and its code.
pub const SEPARATOR: &str = "----";

/// `----` followed by five alphabet symbols, then an extension dot or the end
/// of the name. `W` is outside the class, so `----WWWWW` never matches.
static CODE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"----([A-VX-Z]{5})(\.|$)").unwrap());

fn file_name_of(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or("")
}

/// Extracts an embedded code from the file name component of `path`.
///
/// ```
/// use doccode::codes::extract_code_from_filename;
///
/// assert_eq!(
///     extract_code_from_filename("old_statute----ABXCD.pdf").map(|c| c.to_string()),
///     Some("ABXCD".to_string())
/// );
/// assert!(extract_code_from_filename("bad----WWWWW.pdf").is_none());
/// ```
pub fn extract_code_from_filename<P: AsRef<Path>>(path: P) -> Option<Code> {
    let name = file_name_of(path.as_ref());
    let captures = CODE_SUFFIX.captures(name)?;
    Code::new(captures.get(1)?.as_str()).ok()
}

pub fn has_code_suffix<P: AsRef<Path>>(path: P) -> bool {
    extract_code_from_filename(path).is_some()
}

/// Inserts `----CODE` between the stem and the extension, keeping any parent
/// directory: `/docs/file.txt` becomes `/docs/file----BCDEZ.txt`.
pub fn append_code_to_filename<P: AsRef<Path>>(path: P, code: &Code) -> PathBuf {
    let path = path.as_ref();
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
    let new_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}{}{}.{}", stem, SEPARATOR, code, ext),
        None => format!("{}{}{}", stem, SEPARATOR, code),
    };
    path.with_file_name(new_name)
}

/// Removes every `----CODE` suffix, keeping the extension.
pub fn strip_code_from_filename(name: &str) -> String {
    CODE_SUFFIX.replace_all(name, "$2").into_owned()
}
