//! namedrop - batch file renaming with a preview step
//!
//! This library turns a list of files into a rename plan (title/lower/upper
//! case rules, character substitution, or EXIF/modification timestamps),
//! detects clashes between the proposed names, and applies the plan on disk
//! one file at a time.

pub mod cli;
pub mod config;
pub mod file_list;
pub mod logging;
pub mod output;
pub mod planner;
pub mod renamer;
pub mod timestamp;
pub mod transform;

pub use config::{CompiledFilters, ConfigError, NamedropConfig, RenameOverrides, RenameSettings};
pub use file_list::{AddReport, FileList};
pub use planner::{PlanEntry, PlanStatus, RenamePlan, build_plan};
pub use renamer::{ApplyReport, FileOutcome, RenameError, apply_plan};
pub use timestamp::{FileTimestamp, TimestampSource, file_timestamp};
pub use transform::{CaseMode, TransformError, TransformOptions};

pub use cli::{RenameCommand, RunRequest, run_cli};
