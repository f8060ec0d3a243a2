//! Turning a file list into a rename plan.
//!
//! The planner makes one pass over the files in order. For every parent
//! directory it remembers which names are already spoken for, so two files
//! in the batch never get the same target and no existing file is clobbered.
//! In datetime mode a taken name gets a `-0001`, `-0002`, ... counter; in the
//! case modes it is reported as a conflict.

use crate::timestamp::{self, TimestampSource};
use crate::transform::{self, CaseMode, TransformOptions};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What will happen to one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum PlanStatus {
    Rename,
    Unchanged,
    Conflict(String),
    Error(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
    pub source: PathBuf,
    /// Set for `Rename` and `Unchanged` entries.
    pub target: Option<PathBuf>,
    #[serde(flatten)]
    pub status: PlanStatus,
    /// Datetime mode only.
    pub timestamp: Option<NaiveDateTime>,
    /// Datetime mode only.
    pub timestamp_source: Option<TimestampSource>,
}

impl PlanEntry {
    pub fn source_name(&self) -> String {
        display_name(&self.source)
    }

    pub fn target_name(&self) -> Option<String> {
        self.target.as_deref().map(display_name)
    }

    /// True when the only difference between source and target is letter case.
    pub fn is_case_only_change(&self) -> bool {
        match (self.source.file_name(), self.target.as_deref().and_then(Path::file_name)) {
            (Some(old), Some(new)) => old != new && names_equal_ignoring_case(old, new),
            _ => false,
        }
    }
}

/// The full preview for a batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RenamePlan {
    pub mode: Option<CaseMode>,
    pub entries: Vec<PlanEntry>,
}

impl RenamePlan {
    pub fn renames(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.status == PlanStatus::Rename)
    }

    pub fn unchanged(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.status == PlanStatus::Unchanged)
    }

    /// Conflicts and errors.
    pub fn problems(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|entry| {
            matches!(entry.status, PlanStatus::Conflict(_) | PlanStatus::Error(_))
        })
    }

    pub fn rename_count(&self) -> usize {
        self.renames().count()
    }

    pub fn unchanged_count(&self) -> usize {
        self.unchanged().count()
    }

    pub fn problem_count(&self) -> usize {
        self.problems().count()
    }
}

/// Computes the new name of every file and resolves clashes.
pub fn build_plan(files: &[PathBuf], options: &TransformOptions) -> RenamePlan {
    debug!(files = files.len(), mode = %options.mode, "building rename plan");
    let mut claimed: HashMap<PathBuf, HashSet<String>> = HashMap::new();
    let entries = files
        .iter()
        .map(|source| plan_one(source, options, &mut claimed))
        .collect();

    RenamePlan {
        mode: Some(options.mode),
        entries,
    }
}

fn plan_one(
    source: &Path,
    options: &TransformOptions,
    claimed: &mut HashMap<PathBuf, HashSet<String>>,
) -> PlanEntry {
    let mut entry = PlanEntry {
        source: source.to_path_buf(),
        target: None,
        status: PlanStatus::Unchanged,
        timestamp: None,
        timestamp_source: None,
    };

    let timestamp = if options.mode == CaseMode::DateTime {
        match timestamp::file_timestamp(source) {
            Ok(stamp) => {
                entry.timestamp = Some(stamp.datetime);
                entry.timestamp_source = Some(stamp.source);
                Some(stamp.datetime)
            }
            Err(e) => {
                entry.status = PlanStatus::Error(format!("cannot read timestamp: {}", e));
                return entry;
            }
        }
    } else {
        None
    };

    let proposed = match transform::transform_file_name(source, timestamp, options) {
        Ok(name) => name,
        Err(e) => {
            entry.status = PlanStatus::Error(e.to_string());
            return entry;
        }
    };

    let parent = source.parent().unwrap_or(Path::new("")).to_path_buf();
    let old_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let taken = claimed.entry(claim_key(&parent)).or_default();

    if proposed == old_name {
        taken.insert(proposed);
        entry.target = Some(source.to_path_buf());
        return entry;
    }

    let final_name = if is_occupied(source, &parent, &proposed, taken) {
        if options.mode != CaseMode::DateTime {
            debug!(source = %source.display(), target = %proposed, "target taken");
            entry.status = PlanStatus::Conflict(format!("target '{}' already exists", proposed));
            return entry;
        }
        next_free_name(source, &parent, &proposed, taken)
    } else {
        proposed
    };

    // A counter can land back on the current name.
    if final_name == old_name {
        taken.insert(final_name);
        entry.target = Some(source.to_path_buf());
        return entry;
    }

    entry.target = Some(parent.join(&final_name));
    entry.status = PlanStatus::Rename;
    taken.insert(final_name);
    entry
}

/// One key per directory, however the path to it was spelled.
fn claim_key(dir: &Path) -> PathBuf {
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf())
}

/// First `stem-NNNN.ext` (counter from 1, four digits) that is free.
fn next_free_name(source: &Path, parent: &Path, name: &str, taken: &HashSet<String>) -> String {
    let (stem, ext) = match transform::split_file_name(Path::new(name)) {
        Ok(parts) => parts,
        Err(_) => (name, ""),
    };
    let mut counter = 1u32;
    loop {
        let candidate = format!("{}-{:04}{}", stem, counter, ext);
        if candidate == display_name(source) || !is_occupied(source, parent, &candidate, taken) {
            return candidate;
        }
        counter += 1;
    }
}

/// Whether `name` in `parent` is claimed by the batch or held on disk by a
/// file other than `source`.
pub fn is_occupied(source: &Path, parent: &Path, name: &str, taken: &HashSet<String>) -> bool {
    taken.contains(name) || exists_as_other_file(source, &parent.join(name))
}

/// True when `target` exists on disk and is not just `source` seen through a
/// case-insensitive filesystem.
pub fn exists_as_other_file(source: &Path, target: &Path) -> bool {
    if fs::symlink_metadata(target).is_err() {
        return false;
    }
    match (source.file_name(), target.file_name()) {
        (Some(old), Some(new)) if names_equal_ignoring_case(old, new) => {
            has_exact_entry(target.parent().unwrap_or(Path::new(".")), new)
        }
        _ => true,
    }
}

fn has_exact_entry(dir: &Path, name: &OsStr) -> bool {
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    match fs::read_dir(dir) {
        Ok(entries) => entries.flatten().any(|entry| entry.file_name() == name),
        // Cannot tell; assume the worst.
        Err(_) => true,
    }
}

fn names_equal_ignoring_case(a: &OsStr, b: &OsStr) -> bool {
    a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
