//! Terminal output.
//!
//! Everything the user reads goes through [`OutputFormatter`], so colours and
//! symbols stay consistent between preview and apply.

use crate::file_list::AddReport;
use crate::planner::{PlanStatus, RenamePlan};
use crate::renamer::{ApplyReport, FileOutcome};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

/// How many pending renames the preview lists before summarizing.
pub const PREVIEW_RENAME_LIMIT: usize = 20;
/// How many unchanged files the preview lists before summarizing.
pub const PREVIEW_UNCHANGED_LIMIT: usize = 5;

pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use namedrop::output::OutputFormatter;
    /// OutputFormatter::success("Renamed 3 files");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for the apply step.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Reports how the file list was assembled.
    pub fn add_report(report: &AddReport) {
        if report.added > 0 {
            Self::success(&format!("Added {} file(s)", report.added));
        }
        if report.duplicates > 0 {
            Self::info(&format!("Ignored {} duplicate path(s)", report.duplicates));
        }
        if report.filtered > 0 {
            Self::info(&format!("Filtered out {} file(s)", report.filtered));
        }
        for (path, reason) in &report.rejected {
            Self::warning(&format!("Skipping {}: {}", path.display(), reason));
        }
    }

    /// Prints the preview of a plan. Conflicts and errors go to stderr.
    pub fn plan(plan: &RenamePlan) {
        Self::header("=== PREVIEW ===");
        for line in Self::plan_lines(plan) {
            println!("{}", line);
        }

        let problems = Self::problem_lines(plan);
        if !problems.is_empty() {
            eprintln!(
                "\n{}",
                format!("Errors/Conflicts ({}):", problems.len()).red()
            );
            for line in problems {
                eprintln!("{}", line);
            }
        }

        Self::info(&format!("\n{}", Self::plan_summary(plan)));
    }

    /// Pending renames (first [`PREVIEW_RENAME_LIMIT`]) and unchanged files
    /// (first [`PREVIEW_UNCHANGED_LIMIT`]).
    pub fn plan_lines(plan: &RenamePlan) -> Vec<String> {
        let mut lines = Vec::new();

        let renames: Vec<_> = plan.renames().collect();
        if !renames.is_empty() {
            lines.push(format!("Files to be renamed ({}):", renames.len()).green().to_string());
            for entry in renames.iter().take(PREVIEW_RENAME_LIMIT) {
                let target = entry.target_name().unwrap_or_default();
                lines.push(format!("  {}", entry.source_name()));
                lines.push(format!("  {} {}", "→".green(), target.green()));
            }
            if renames.len() > PREVIEW_RENAME_LIMIT {
                lines.push(
                    format!("  ... and {} more", renames.len() - PREVIEW_RENAME_LIMIT)
                        .cyan()
                        .to_string(),
                );
            }
        }

        let unchanged: Vec<_> = plan.unchanged().collect();
        if !unchanged.is_empty() {
            lines.push(String::new());
            lines.push(format!("No changes needed ({}):", unchanged.len()).yellow().to_string());
            for entry in unchanged.iter().take(PREVIEW_UNCHANGED_LIMIT) {
                lines.push(format!("  {}", entry.source_name().yellow()));
            }
            if unchanged.len() > PREVIEW_UNCHANGED_LIMIT {
                lines.push(
                    format!("  ... and {} more", unchanged.len() - PREVIEW_UNCHANGED_LIMIT)
                        .yellow()
                        .to_string(),
                );
            }
        }

        lines
    }

    /// Every conflict and error, with its reason.
    pub fn problem_lines(plan: &RenamePlan) -> Vec<String> {
        plan.problems()
            .map(|entry| {
                let reason = match &entry.status {
                    PlanStatus::Conflict(reason) | PlanStatus::Error(reason) => reason.as_str(),
                    _ => "",
                };
                format!("  {}: {}", entry.source_name().red(), reason)
            })
            .collect()
    }

    pub fn plan_summary(plan: &RenamePlan) -> String {
        format!(
            "=== Summary: {} to rename, {} unchanged, {} errors ===",
            plan.rename_count(),
            plan.unchanged_count(),
            plan.problem_count()
        )
    }

    /// One line per processed file during apply.
    pub fn outcome(outcome: &FileOutcome) -> String {
        match outcome {
            FileOutcome::Renamed { from, to } => format!(
                "{} SUCCESS: {} → {}",
                "✓".green(),
                file_name(from),
                file_name(to)
            ),
            FileOutcome::Skipped { path, reason } => format!(
                "{} SKIP: {} ({})",
                "⊘".yellow(),
                file_name(path),
                reason
            ),
            FileOutcome::Failed { path, reason } => format!(
                "{} ERROR: {} - {}",
                "✗".red(),
                file_name(path),
                reason
            ),
        }
    }

    pub fn apply_summary(report: &ApplyReport) {
        Self::info(&format!(
            "\n=== COMPLETE: {} renamed, {} skipped, {} errors ===",
            report.renamed_count(),
            report.skipped_count(),
            report.failed_count()
        ));
    }

    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[PREVIEW] {}", message).yellow());
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::PlanEntry;
    use crate::transform::CaseMode;
    use std::path::PathBuf;

    fn entry(name: &str, target: Option<&str>, status: PlanStatus) -> PlanEntry {
        PlanEntry {
            source: PathBuf::from("/x").join(name),
            target: target.map(|t| PathBuf::from("/x").join(t)),
            status,
            timestamp: None,
            timestamp_source: None,
        }
    }

    fn sample_plan(renames: usize, unchanged: usize, conflicts: usize) -> RenamePlan {
        let mut entries = Vec::new();
        for i in 0..renames {
            let from = format!("file_{:02}.txt", i);
            let to = format!("File {:02}.txt", i);
            entries.push(entry(&from, Some(&to), PlanStatus::Rename));
        }
        for i in 0..unchanged {
            let name = format!("Same {:02}.txt", i);
            entries.push(entry(&name, Some(&name), PlanStatus::Unchanged));
        }
        for i in 0..conflicts {
            entries.push(entry(
                &format!("clash_{}.txt", i),
                None,
                PlanStatus::Conflict("target 'Clash.txt' already exists".to_string()),
            ));
        }
        RenamePlan {
            mode: Some(CaseMode::Title),
            entries,
        }
    }

    #[test]
    fn test_plan_lines_respect_limits() {
        colored::control::set_override(false);

        let plan = sample_plan(25, 7, 2);
        let lines = OutputFormatter::plan_lines(&plan);

        assert_eq!(lines[0], "Files to be renamed (25):");
        assert_eq!(lines.iter().filter(|l| l.starts_with("  → ")).count(), 20);
        assert!(lines.contains(&"  → File 19.txt".to_string()));
        assert!(!lines.contains(&"  → File 20.txt".to_string()));
        assert!(lines.contains(&"  ... and 5 more".to_string()));

        assert!(lines.contains(&"No changes needed (7):".to_string()));
        assert!(lines.contains(&"  Same 04.txt".to_string()));
        assert!(!lines.contains(&"  Same 05.txt".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("  ... and 2 more"));

        assert_eq!(
            OutputFormatter::problem_lines(&plan),
            vec![
                "  clash_0.txt: target 'Clash.txt' already exists",
                "  clash_1.txt: target 'Clash.txt' already exists",
            ]
        );
        assert_eq!(
            OutputFormatter::plan_summary(&plan),
            "=== Summary: 25 to rename, 7 unchanged, 2 errors ==="
        );
    }

    #[test]
    fn test_small_plan_has_no_overflow_lines() {
        colored::control::set_override(false);

        let plan = sample_plan(2, 1, 0);
        let lines = OutputFormatter::plan_lines(&plan);

        assert_eq!(
            lines,
            vec![
                "Files to be renamed (2):",
                "  file_00.txt",
                "  → File 00.txt",
                "  file_01.txt",
                "  → File 01.txt",
                "",
                "No changes needed (1):",
                "  Same 00.txt",
            ]
        );
        assert!(OutputFormatter::problem_lines(&plan).is_empty());
    }

    #[test]
    fn test_outcome_lines() {
        colored::control::set_override(false);

        let renamed = FileOutcome::Renamed {
            from: PathBuf::from("/x/a b.txt"),
            to: PathBuf::from("/x/A B.txt"),
        };
        assert_eq!(
            OutputFormatter::outcome(&renamed),
            "✓ SUCCESS: a b.txt → A B.txt"
        );

        let skipped = FileOutcome::Skipped {
            path: PathBuf::from("/x/Fine.txt"),
            reason: "no change needed".to_string(),
        };
        assert_eq!(
            OutputFormatter::outcome(&skipped),
            "⊘ SKIP: Fine.txt (no change needed)"
        );

        let failed = FileOutcome::Failed {
            path: PathBuf::from("/x/a.txt"),
            reason: "target 'A.txt' already exists".to_string(),
        };
        assert_eq!(
            OutputFormatter::outcome(&failed),
            "✗ ERROR: a.txt - target 'A.txt' already exists"
        );
    }
}
