use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::sanitize::redact_path;

/// Finds the files a batch will process.
pub struct DirectoryScanner {
    folder: PathBuf,
    extensions: Vec<String>,
}

impl DirectoryScanner {
    /// `extensions` are matched case-insensitively, without the dot.
    pub fn new<P: AsRef<Path>>(folder: P, extensions: &[String]) -> Self {
        Self {
            folder: folder.as_ref().to_path_buf(),
            extensions: extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Every matching file below the folder, recursively, sorted by path.
    /// Unreadable entries are skipped.
    pub fn scan(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(&self.folder)
            .min_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| self.matches(path))
            .collect();
        files.sort();

        for path in &files {
            debug!("Found document: {}", redact_path(path));
        }
        info!("Scanned {} documents in {}", files.len(), self.folder.display());
        files
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// `"No PDF or DOCX files found in folder"` for the default extensions.
    pub fn empty_folder_warning(&self) -> String {
        let kinds: Vec<String> = self.extensions.iter().map(|e| e.to_uppercase()).collect();
        format!("No {} files found in folder", kinds.join(" or "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn extensions() -> Vec<String> {
        vec!["pdf".to_string(), "docx".to_string()]
    }

    #[test]
    fn test_scan_recursive_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        for name in ["b.pdf", "a.DOCX", "nested/c.pdf", "notes.txt"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }

        let files = DirectoryScanner::new(dir.path(), &extensions()).scan();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.DOCX", "b.pdf", "nested/c.pdf"]);
    }

    #[test]
    fn test_scan_missing_folder_is_empty() {
        let dir = TempDir::new().unwrap();
        let scanner = DirectoryScanner::new(dir.path().join("missing"), &extensions());
        assert!(scanner.scan().is_empty());
    }

    #[test]
    fn test_empty_folder_warning() {
        let scanner = DirectoryScanner::new("/in", &extensions());
        assert_eq!(scanner.empty_folder_warning(), "No PDF or DOCX files found in folder");
    }
}
