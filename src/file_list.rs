//! The list of files queued for renaming.
//!
//! Paths keep the order they were added in. Folders contribute their regular
//! files in name order, subject to the configured [`CompiledFilters`].

use crate::config::CompiledFilters;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Outcome of adding one path to a [`FileList`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct AddReport {
    pub added: usize,
    pub duplicates: usize,
    pub filtered: usize,
    pub rejected: Vec<(PathBuf, String)>,
}

impl AddReport {
    fn merge(&mut self, other: AddReport) {
        self.added += other.added;
        self.duplicates += other.duplicates;
        self.filtered += other.filtered;
        self.rejected.extend(other.rejected);
    }
}

/// Ordered, deduplicated list of files.
#[derive(Debug, Default)]
pub struct FileList {
    files: Vec<PathBuf>,
    keys: HashSet<PathBuf>,
    filters: CompiledFilters,
    recursive: bool,
}

impl FileList {
    pub fn new(filters: CompiledFilters, recursive: bool) -> Self {
        Self {
            files: Vec::new(),
            keys: HashSet::new(),
            filters,
            recursive,
        }
    }

    /// Adds a file, or the files inside a folder.
    pub fn add_path(&mut self, path: &Path) -> AddReport {
        let mut report = AddReport::default();
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot add path");
                report.rejected.push((path.to_path_buf(), e.to_string()));
                return report;
            }
        };

        if metadata.is_file() {
            self.push(path.to_path_buf(), &mut report);
        } else if metadata.is_dir() {
            match self.folder_files(path) {
                Ok(files) => {
                    for file in files {
                        if self.filters.should_include(&file) {
                            self.push(file, &mut report);
                        } else {
                            report.filtered += 1;
                        }
                    }
                }
                Err(reason) => report.rejected.push((path.to_path_buf(), reason)),
            }
        } else {
            report
                .rejected
                .push((path.to_path_buf(), "not a regular file or folder".to_string()));
        }

        debug!(
            path = %path.display(),
            added = report.added,
            duplicates = report.duplicates,
            filtered = report.filtered,
            "added path"
        );
        report
    }

    /// Adds several paths and merges their reports.
    pub fn add_paths<I, P>(&mut self, paths: I) -> AddReport
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut report = AddReport::default();
        for path in paths {
            report.merge(self.add_path(path.as_ref()));
        }
        report
    }

    /// Removes a file; returns whether it was present.
    pub fn remove(&mut self, path: &Path) -> bool {
        let key = dedupe_key(path);
        if !self.keys.remove(&key) {
            return false;
        }
        self.files.retain(|file| dedupe_key(file) != key);
        true
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.files
    }

    fn push(&mut self, path: PathBuf, report: &mut AddReport) {
        if self.keys.insert(dedupe_key(&path)) {
            self.files.push(path);
            report.added += 1;
        } else {
            report.duplicates += 1;
        }
    }

    fn folder_files(&self, dir: &Path) -> Result<Vec<PathBuf>, String> {
        let mut files = Vec::new();
        if self.recursive {
            for entry in WalkDir::new(dir).sort_by_file_name() {
                let entry = entry.map_err(|e| format!("Error walking {}: {}", dir.display(), e))?;
                if entry.file_type().is_file() {
                    files.push(entry.into_path());
                }
            }
            return Ok(files);
        }

        let entries = fs::read_dir(dir)
            .map_err(|e| format!("Error reading directory {}: {}", dir.display(), e))?;
        for entry in entries.flatten() {
            if let Ok(file_type) = entry.file_type()
                && file_type.is_file()
            {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }
}

fn dedupe_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FilterRules;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, name).expect("Failed to write test file");
        path
    }

    #[test]
    fn test_add_file_and_dedupe() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = touch(temp_dir.path(), "a.txt");

        let mut list = FileList::default();
        assert_eq!(list.add_path(&file).added, 1);

        let again = list.add_path(&temp_dir.path().join(".").join("a.txt"));
        assert_eq!(again.added, 0);
        assert_eq!(again.duplicates, 1);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_add_folder_is_sorted_and_shallow() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "b.txt");
        touch(temp_dir.path(), "a.txt");
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        touch(&temp_dir.path().join("sub"), "c.txt");

        let mut list = FileList::default();
        let report = list.add_path(temp_dir.path());

        assert_eq!(report.added, 2);
        let names: Vec<_> = list
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_add_folder_recursive() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "a.txt");
        fs::create_dir(temp_dir.path().join("sub")).unwrap();
        touch(&temp_dir.path().join("sub"), "c.txt");

        let mut list = FileList::new(CompiledFilters::default(), true);
        assert_eq!(list.add_path(temp_dir.path()).added, 2);
    }

    #[test]
    fn test_folder_expansion_applies_filters() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), ".hidden");
        touch(temp_dir.path(), "photo.jpg");
        let hidden = temp_dir.path().join(".hidden");

        let mut list = FileList::new(FilterRules::default().compile().unwrap(), false);
        let report = list.add_path(temp_dir.path());
        assert_eq!(report.added, 1);
        assert_eq!(report.filtered, 1);

        // Named explicitly, the hidden file is taken.
        assert_eq!(list.add_path(&hidden).added, 1);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_missing_path_is_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let mut list = FileList::default();
        let report = list.add_path(&temp_dir.path().join("missing.txt"));

        assert_eq!(report.added, 0);
        assert_eq!(report.rejected.len(), 1);
        assert!(list.is_empty());
    }

    #[test]
    fn test_remove_and_clear() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = touch(temp_dir.path(), "a.txt");
        let b = touch(temp_dir.path(), "b.txt");

        let mut list = FileList::default();
        let report = list.add_paths([&a, &b]);
        assert_eq!(report.added, 2);

        assert!(list.remove(&a));
        assert!(!list.remove(&a));
        assert_eq!(list.paths(), &[b.clone()]);

        list.clear();
        assert!(list.is_empty());
        assert_eq!(list.add_path(&b).added, 1);
    }
}
