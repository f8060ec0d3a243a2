//! Carrying out a rename plan on disk.
//!
//! Entries are processed one at a time, in plan order. A failure affects only
//! its own file; the rest of the batch keeps going. Targets are re-checked
//! right before each rename and are never overwritten.

use crate::planner::{self, PlanEntry, PlanStatus, RenamePlan};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Suffix of the intermediate name used for case-only renames.
const CASE_HOP_SUFFIX: &str = ".tmp_rename";

/// Errors that can occur while renaming a single file.
#[derive(Debug, Error)]
pub enum RenameError {
    #[error("source file {} no longer exists", .0.display())]
    SourceMissing(PathBuf),

    #[error("target {} already exists", .0.display())]
    TargetExists(PathBuf),

    #[error("failed to rename {} to {}: {source}", .from.display(), .to.display())]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for rename operations.
pub type RenameResult<T> = Result<T, RenameError>;

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum FileOutcome {
    Renamed { from: PathBuf, to: PathBuf },
    Skipped { path: PathBuf, reason: String },
    Failed { path: PathBuf, reason: String },
}

/// Per-batch summary.
#[derive(Debug, Default, Serialize)]
pub struct ApplyReport {
    pub outcomes: Vec<FileOutcome>,
}

impl ApplyReport {
    pub fn renamed_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Renamed { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed_count() == 0
    }

    fn count(&self, pred: impl Fn(&FileOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Applies every entry of `plan`, calling `on_progress` after each file.
pub fn apply_plan<F>(plan: &RenamePlan, mut on_progress: F) -> ApplyReport
where
    F: FnMut(&FileOutcome),
{
    let mut report = ApplyReport::default();
    for entry in &plan.entries {
        let outcome = apply_entry(entry);
        on_progress(&outcome);
        report.outcomes.push(outcome);
    }
    info!(
        renamed = report.renamed_count(),
        skipped = report.skipped_count(),
        failed = report.failed_count(),
        "apply finished"
    );
    report
}

fn apply_entry(entry: &PlanEntry) -> FileOutcome {
    let path = entry.source.clone();
    match (&entry.status, &entry.target) {
        (PlanStatus::Unchanged, _) => FileOutcome::Skipped {
            path,
            reason: "no change needed".to_string(),
        },
        (PlanStatus::Conflict(reason) | PlanStatus::Error(reason), _) => FileOutcome::Failed {
            path,
            reason: reason.clone(),
        },
        (PlanStatus::Rename, None) => FileOutcome::Failed {
            path,
            reason: "no target computed".to_string(),
        },
        (PlanStatus::Rename, Some(target)) => match rename_file(&entry.source, target) {
            Ok(()) => FileOutcome::Renamed {
                from: path,
                to: target.clone(),
            },
            Err(e) => {
                warn!(error = %e, "rename failed");
                FileOutcome::Failed {
                    path,
                    reason: e.to_string(),
                }
            }
        },
    }
}

/// Renames `source` to `target`, refusing to replace another file.
///
/// A change that only touches letter case goes through an intermediate name
/// so case-insensitive filesystems record the new spelling.
///
/// # Errors
///
/// Returns an error if the source is gone, the target is taken, or the
/// filesystem rejects the rename.
pub fn rename_file(source: &Path, target: &Path) -> RenameResult<()> {
    if fs::symlink_metadata(source).is_err() {
        return Err(RenameError::SourceMissing(source.to_path_buf()));
    }
    if planner::exists_as_other_file(source, target) {
        return Err(RenameError::TargetExists(target.to_path_buf()));
    }

    let case_only = match (source.file_name(), target.file_name()) {
        (Some(old), Some(new)) => {
            old != new && old.to_string_lossy().to_lowercase() == new.to_string_lossy().to_lowercase()
        }
        _ => false,
    };

    if !case_only {
        return rename(source, target);
    }

    let mut hop_name = target.file_name().unwrap_or_default().to_os_string();
    hop_name.push(CASE_HOP_SUFFIX);
    let hop = target.with_file_name(hop_name);
    if fs::symlink_metadata(&hop).is_ok() {
        return Err(RenameError::TargetExists(hop));
    }

    rename(source, &hop)?;
    if let Err(e) = rename(&hop, target) {
        // Put the file back under its old name.
        if let Err(restore) = fs::rename(&hop, source) {
            warn!(hop = %hop.display(), error = %restore, "could not restore after failed case rename");
        }
        return Err(e);
    }
    Ok(())
}

fn rename(from: &Path, to: &Path) -> RenameResult<()> {
    fs::rename(from, to).map_err(|source| RenameError::RenameFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::build_plan;
    use crate::transform::{CaseMode, TransformOptions};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).expect("Failed to write test file");
        path
    }

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .expect("Failed to read dir")
            .flatten()
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_rename_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = touch(temp_dir.path(), "a.txt", "content");
        let target = temp_dir.path().join("b.txt");

        rename_file(&source, &target).expect("rename");

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "content");
    }

    #[test]
    fn test_rename_refuses_to_overwrite() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = touch(temp_dir.path(), "a.txt", "mine");
        let target = touch(temp_dir.path(), "b.txt", "theirs");

        let result = rename_file(&source, &target);

        assert!(matches!(result, Err(RenameError::TargetExists(_))));
        assert_eq!(fs::read_to_string(&target).unwrap(), "theirs");
        assert!(source.exists());
    }

    #[test]
    fn test_rename_missing_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = rename_file(
            &temp_dir.path().join("gone.txt"),
            &temp_dir.path().join("b.txt"),
        );
        assert!(matches!(result, Err(RenameError::SourceMissing(_))));
    }

    #[test]
    fn test_case_only_rename() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = touch(temp_dir.path(), "LOUD.txt", "x");

        rename_file(&source, &temp_dir.path().join("loud.txt")).expect("rename");

        assert_eq!(names_in(temp_dir.path()), vec!["loud.txt"]);
    }

    #[test]
    fn test_apply_plan_reports_each_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = touch(temp_dir.path(), "first_file.txt", "1");
        let b = touch(temp_dir.path(), "First File.txt", "2");
        let c = touch(temp_dir.path(), "first-file.txt", "3");

        let options = TransformOptions {
            mode: CaseMode::Title,
            ..Default::default()
        };
        let plan = build_plan(&[a.clone(), b, c.clone()], &options);

        let mut seen = 0;
        let report = apply_plan(&plan, |_| seen += 1);

        assert_eq!(seen, 3);
        assert_eq!(report.renamed_count(), 0);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.failed_count(), 2);
        assert!(!report.is_complete_success());
        assert!(a.exists());
        assert!(c.exists());
    }

    #[test]
    fn test_apply_plan_renames() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = touch(temp_dir.path(), "IMG One.jpg", "1");
        let b = touch(temp_dir.path(), "IMG Two.jpg", "2");

        let options = TransformOptions {
            mode: CaseMode::Lower,
            replace_spaces: true,
            ..Default::default()
        };
        let plan = build_plan(&[a, b], &options);
        let report = apply_plan(&plan, |_| {});

        assert_eq!(report.renamed_count(), 2);
        assert!(report.is_complete_success());
        assert_eq!(names_in(temp_dir.path()), vec!["img_one.jpg", "img_two.jpg"]);
    }

    #[test]
    fn test_target_appearing_after_preview_is_not_overwritten() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = touch(temp_dir.path(), "draft.txt", "draft");

        let options = TransformOptions {
            mode: CaseMode::Upper,
            ..Default::default()
        };
        let plan = build_plan(&[source.clone()], &options);
        assert_eq!(plan.rename_count(), 1);

        // On case-insensitive filesystems this write lands on the source itself.
        fs::write(temp_dir.path().join("DRAFT.txt"), "intruder").unwrap();
        if names_in(temp_dir.path()).len() == 1 {
            return;
        }

        let report = apply_plan(&plan, |_| {});
        assert_eq!(report.failed_count(), 1);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("DRAFT.txt")).unwrap(),
            "intruder"
        );
        assert!(source.exists());
    }
}
