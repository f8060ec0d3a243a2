//! Command-line interface for namedrop.
//!
//! This module handles:
//! - Argument parsing
//! - Loading configuration and merging command-line overrides
//! - Building the file list and the rename plan
//! - Previewing, confirming and applying renames

use crate::config::{NamedropConfig, RenameOverrides};
use crate::file_list::FileList;
use crate::output::OutputFormatter;
use crate::planner::{self, RenamePlan};
use crate::renamer::{self, ApplyReport};
use crate::transform::CaseMode;
use clap::{Parser, ValueHint};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;

/// Batch-rename files by case rules, character substitution, or timestamps.
///
/// Without --apply nothing is renamed; the planned changes are only shown.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Files or folders to rename. Folders contribute the files inside them.
    #[arg(required = true, value_name = "PATHS", value_hint = ValueHint::AnyPath)]
    pub paths: Vec<PathBuf>,

    /// Renaming rule.
    #[arg(short, long, value_enum)]
    pub mode: Option<CaseMode>,

    /// Capitalize minor words too (title mode).
    #[arg(long)]
    pub no_minor_words: bool,

    /// Replace spaces with underscores (lower/upper modes).
    #[arg(long)]
    pub replace_spaces: bool,

    /// Strip punctuation and other non-alphanumeric characters (lower/upper modes).
    #[arg(long)]
    pub strip_punctuation: bool,

    /// Replace special/reserved characters with underscores.
    #[arg(long)]
    pub replace_special: bool,

    /// strftime-style format for datetime mode, e.g. "IMG_%Y%m%d_%H%M%S".
    #[arg(long, value_name = "FORMAT")]
    pub datetime_format: Option<String>,

    /// Descend into subfolders when a folder is given.
    #[arg(short, long)]
    pub recursive: bool,

    /// Perform the renames after showing the preview.
    #[arg(long)]
    pub apply: bool,

    /// Do not ask for confirmation before renaming.
    #[arg(short = 'y', long = "yes", requires = "apply")]
    pub assume_yes: bool,

    /// Configuration file (defaults to .namedroprc.toml or ~/.config/namedrop/config.toml).
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Print the plan or the apply report as JSON.
    #[arg(long)]
    pub json: bool,

    /// More diagnostic logging (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn command(&self) -> RenameCommand {
        if self.apply {
            RenameCommand::Apply {
                assume_yes: self.assume_yes,
            }
        } else {
            RenameCommand::Preview
        }
    }

    pub fn overrides(&self) -> RenameOverrides {
        RenameOverrides {
            mode: self.mode,
            no_minor_words: self.no_minor_words,
            replace_spaces: self.replace_spaces,
            strip_punctuation: self.strip_punctuation,
            replace_special: self.replace_special,
            datetime_format: self.datetime_format.clone(),
        }
    }
}

/// What to do with the computed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameCommand {
    /// Show the plan only.
    Preview,
    /// Show the plan, confirm, then rename.
    Apply {
        /// Skip the confirmation prompt.
        assume_yes: bool,
    },
}

/// Inputs for one run, independent of how they were parsed.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub paths: Vec<PathBuf>,
    pub overrides: RenameOverrides,
    pub recursive: bool,
    pub config_path: Option<PathBuf>,
    pub json: bool,
}

impl From<&Args> for RunRequest {
    fn from(args: &Args) -> Self {
        Self {
            paths: args.paths.clone(),
            overrides: args.overrides(),
            recursive: args.recursive,
            config_path: args.config.clone(),
            json: args.json,
        }
    }
}

/// Result of a run.
#[derive(Debug)]
pub struct RunSummary {
    pub plan: RenamePlan,
    /// `None` for previews and declined confirmations.
    pub report: Option<ApplyReport>,
}

impl RunSummary {
    /// True when something went wrong that the exit code should reflect.
    pub fn has_failures(&self) -> bool {
        match &self.report {
            Some(report) => !report.is_complete_success(),
            None => false,
        }
    }
}

/// Runs namedrop with the given command, reading confirmation from stdin.
///
/// # Examples
///
/// ```no_run
/// use namedrop::cli::{run_cli, RenameCommand, RunRequest};
/// use std::path::PathBuf;
///
/// let request = RunRequest {
///     paths: vec![PathBuf::from("/path/to/photos")],
///     ..Default::default()
/// };
/// match run_cli(RenameCommand::Preview, &request) {
///     Ok(summary) => println!("{} files would be renamed", summary.plan.rename_count()),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(command: RenameCommand, request: &RunRequest) -> Result<RunSummary, String> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    run_cli_with_input(command, request, &mut input)
}

/// Same as [`run_cli`], with the confirmation answer read from `input`.
pub fn run_cli_with_input(
    command: RenameCommand,
    request: &RunRequest,
    input: &mut dyn BufRead,
) -> Result<RunSummary, String> {
    let config = NamedropConfig::load(request.config_path.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let mut settings = config.rename;
    settings.apply_overrides(&request.overrides);
    let options = settings
        .to_transform_options()
        .map_err(|e| format!("Error in rename settings: {}", e))?;
    let filters = config
        .filters
        .compile()
        .map_err(|e| format!("Error compiling filters: {}", e))?;

    let mut files = FileList::new(filters, request.recursive);
    let add_report = files.add_paths(&request.paths);
    if !request.json {
        OutputFormatter::add_report(&add_report);
    }
    if files.is_empty() {
        return Err("No files to rename".to_string());
    }

    info!(files = files.len(), mode = %options.mode, "planning renames");
    let plan = planner::build_plan(files.paths(), &options);

    match command {
        RenameCommand::Preview => {
            if request.json {
                print_json(&plan)?;
            } else {
                OutputFormatter::plan(&plan);
                OutputFormatter::dry_run_notice(
                    "No files were renamed. Run again with --apply to rename.",
                );
            }
            Ok(RunSummary { plan, report: None })
        }
        RenameCommand::Apply { assume_yes } => {
            if !request.json {
                OutputFormatter::plan(&plan);
            }

            if plan.rename_count() == 0 {
                if !request.json {
                    OutputFormatter::info("Nothing to rename.");
                }
            } else if !assume_yes && !confirm(plan.rename_count(), input)? {
                if !request.json {
                    OutputFormatter::warning("Cancelled. No files were renamed.");
                }
                return Ok(RunSummary { plan, report: None });
            }

            let report = apply_with_progress(&plan, request.json);
            if request.json {
                print_json(&report)?;
            } else {
                OutputFormatter::apply_summary(&report);
            }
            Ok(RunSummary {
                plan,
                report: Some(report),
            })
        }
    }
}

fn apply_with_progress(plan: &RenamePlan, quiet: bool) -> ApplyReport {
    if quiet {
        return renamer::apply_plan(plan, |_| {});
    }

    OutputFormatter::header("=== RENAMING FILES ===");
    let pb = OutputFormatter::create_progress_bar(plan.entries.len() as u64);
    let report = renamer::apply_plan(plan, |outcome| {
        pb.println(OutputFormatter::outcome(outcome));
        pb.inc(1);
    });
    pb.finish_with_message("Complete!");
    report
}

/// Asks before touching the disk. Anything but y/yes declines.
fn confirm(count: usize, input: &mut dyn BufRead) -> Result<bool, String> {
    eprint!(
        "\nRename {} file(s)? This action cannot be undone. [y/N] ",
        count
    );
    io::stderr()
        .flush()
        .map_err(|e| format!("Error writing prompt: {}", e))?;

    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|e| format!("Error reading confirmation: {}", e))?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Error serializing output: {}", e))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_preview_by_default() {
        let args = Args::try_parse_from(["namedrop", "a.txt", "b.txt"]).unwrap();
        assert_eq!(args.command(), RenameCommand::Preview);
        assert_eq!(args.paths.len(), 2);
        assert!(args.overrides().mode.is_none());
    }

    #[test]
    fn test_args_parse_apply_and_options() {
        let args = Args::try_parse_from([
            "namedrop",
            "--mode",
            "datetime",
            "--datetime-format",
            "%Y",
            "--apply",
            "-y",
            "-vv",
            "photos",
        ])
        .unwrap();

        assert_eq!(args.command(), RenameCommand::Apply { assume_yes: true });
        assert_eq!(args.mode, Some(CaseMode::DateTime));
        assert_eq!(args.verbose, 2);
        assert_eq!(args.overrides().datetime_format.as_deref(), Some("%Y"));
    }

    #[test]
    fn test_yes_requires_apply() {
        assert!(Args::try_parse_from(["namedrop", "-y", "a.txt"]).is_err());
    }

    #[test]
    fn test_paths_are_required() {
        assert!(Args::try_parse_from(["namedrop"]).is_err());
    }

    #[test]
    fn test_declined_json_run_returns_no_report() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("quiet.txt");
        std::fs::write(&file, "x").expect("Failed to write test file");
        let config = temp_dir.path().join("namedrop.toml");
        std::fs::write(&config, "").expect("Failed to write config");

        let request = RunRequest {
            paths: vec![file.clone()],
            overrides: RenameOverrides {
                mode: Some(CaseMode::Upper),
                ..Default::default()
            },
            config_path: Some(config),
            json: true,
            ..Default::default()
        };
        let summary = run_cli_with_input(
            RenameCommand::Apply { assume_yes: false },
            &request,
            &mut "no\n".as_bytes(),
        )
        .expect("run");

        assert!(summary.report.is_none());
        assert!(!summary.has_failures());
        assert!(file.exists());
    }

    #[test]
    fn test_confirm_answers() {
        assert!(confirm(1, &mut "y\n".as_bytes()).unwrap());
        assert!(confirm(1, &mut "YES\n".as_bytes()).unwrap());
        assert!(!confirm(1, &mut "n\n".as_bytes()).unwrap());
        assert!(!confirm(1, &mut "".as_bytes()).unwrap());
    }
}
