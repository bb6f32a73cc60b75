//! Output formatting for human and JSON modes
//!
//! This module provides structured output that can be rendered either as
//! human-readable text or machine-parseable JSON.

use colored::Colorize;
use serde::Serialize;

use crate::core::models::{
    PipelineReport, RunScope, ScopeDecision, ScopeDecisionInputs, StageReport, StageStatus,
    UnitManifest, Violation,
};
use crate::core::services::{FileFix, SkippedFile, UnitStatus};

/// Output mode for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output (machine-readable)
    Json,
}

/// Result of a scan
#[derive(Debug, Serialize)]
pub struct ScanResult {
    /// Whether no violation was reported
    pub passed: bool,
    /// Number of files scanned
    pub files_scanned: usize,
    /// Violations, ordered by file and line
    pub violations: Vec<Violation>,
    /// Files that could not be read
    pub skipped: Vec<SkippedFile>,
    /// Fixes written to disk (`--fix` only)
    pub fixes: Vec<FileFix>,
}

/// Result of a pipeline run
#[derive(Debug, Serialize)]
pub struct RunResult {
    /// Invocation context
    pub scope: RunScope,
    /// Per-stage outcome
    #[serde(flatten)]
    pub report: PipelineReport,
}

/// Result of generating manifests
#[derive(Debug, Serialize)]
pub struct ManifestGenerateResult {
    /// One entry per generated unit
    pub generated: Vec<GeneratedManifest>,
}

/// Summary of one generated manifest
#[derive(Debug, Serialize)]
pub struct GeneratedManifest {
    /// Unit id
    pub unit: String,
    /// New unit digest
    pub unit_digest: String,
    /// Number of files digested
    pub files: usize,
}

/// Result of checking units
#[derive(Debug, Serialize)]
pub struct UnitCheckResult {
    /// Whether every unit is fresh
    pub passed: bool,
    /// Per-unit status
    pub units: Vec<UnitCheck>,
}

/// Status of one checked unit
#[derive(Debug, Serialize)]
pub struct UnitCheck {
    /// Unit id
    pub unit: String,
    /// Fresh or expired
    #[serde(flatten)]
    pub status: UnitStatus,
    /// Whether the expired manifest and artifact were deleted
    pub expired: bool,
}

/// A stored manifest, if any
#[derive(Debug, Serialize)]
pub struct ManifestShowResult {
    /// Unit id
    pub unit: String,
    /// The parsed manifest
    pub manifest: Option<UnitManifest>,
    /// Why the stored manifest could not be read, if it could not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

/// Result of the `scope` command
#[derive(Debug, Serialize)]
pub struct ScopeResult {
    /// Secondary-suite evidence and decision, when a suite is configured
    pub secondary: Option<SecondaryScope>,
    /// Narrowed lint files per lint stage (`--changed-only` only)
    pub narrowed: Vec<NarrowedStage>,
}

/// Secondary-suite evidence and decision
#[derive(Debug, Serialize)]
pub struct SecondaryScope {
    /// Gathered inputs
    pub inputs: ScopeDecisionInputs,
    /// Decision made from them
    pub decision: ScopeDecision,
}

/// Changed-only file set for one lint stage
#[derive(Debug, Serialize)]
pub struct NarrowedStage {
    /// Stage id
    pub stage: String,
    /// Files, `None` for the full tree
    pub files: Option<Vec<String>>,
}

/// Result of a baseline operation
#[derive(Debug, Serialize)]
pub struct BaselineResult {
    /// Stored marker
    pub last_verified: Option<String>,
    /// Whether this invocation wrote it
    pub marked: bool,
}

/// Generic operation result for simple commands
#[derive(Debug, Serialize)]
pub struct OperationResult {
    /// Whether the operation succeeded
    pub success: bool,
    /// Result message
    pub message: String,
}

// =============================================================================
// SCAN
// =============================================================================

impl ScanResult {
    /// Render the result
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => self.render_json(),
        }
    }

    fn render_human(&self) {
        for skipped in &self.skipped {
            println!("{} skipped {}: {}", "warning:".yellow(), skipped.path, skipped.error);
        }
        for violation in &self.violations {
            println!("{violation}");
        }
        for fix in &self.fixes {
            println!("fixed {} ({} replacement(s))", fix.path, fix.replacements);
        }

        println!("{}", self.summary_line());
    }

    /// Final pass/fail line
    #[must_use]
    pub fn summary_line(&self) -> String {
        if self.passed {
            format!("{}: {} file(s) scanned, no violations", "PASS".green().bold(), self.files_scanned)
        } else {
            format!(
                "{}: {} violation(s) in {} file(s) scanned",
                "FAIL".red().bold(),
                self.violations.len(),
                self.files_scanned
            )
        }
    }

    fn render_json(&self) {
        println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
    }
}

// =============================================================================
// RUN
// =============================================================================

impl RunResult {
    /// Render the result
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => self.render_json(),
        }
    }

    fn render_human(&self) {
        println!("Running {} stage(s) ({})\n", self.report.stages.len(), self.scope);

        for stage in &self.report.stages {
            println!("  {}  {}", status_tag(&stage.status), stage_line(stage));
        }

        for stage in self.report.stages.iter().filter(|s| s.status.is_failed()) {
            print_failure(stage);
        }

        println!();
        println!("{}", self.summary_line());
    }

    /// Final pass/fail line
    #[must_use]
    pub fn summary_line(&self) -> String {
        let report = &self.report;
        match report.first_failure() {
            None => format!(
                "{}: {} stage(s) passed in {}ms",
                "PASS".green().bold(),
                report.passed_count(),
                report.duration_ms
            ),
            Some(_) if !self.scope.is_gate() => format!(
                "{}: {} of {} stage(s) failed (diagnostics, not blocking)",
                "DIAG".yellow().bold(),
                report.failed_count(),
                report.stages.len()
            ),
            Some(failed) => {
                let reason = match &failed.status {
                    StageStatus::Failed { failure } => failure.to_string(),
                    _ => String::new(),
                };
                format!("{}: stage {} {reason}", "FAIL".red().bold(), failed.stage_id)
            },
        }
    }

    fn render_json(&self) {
        println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
    }
}

fn status_tag(status: &StageStatus) -> colored::ColoredString {
    match status {
        StageStatus::Succeeded => "PASS".green(),
        StageStatus::Failed { .. } => "FAIL".red().bold(),
        StageStatus::Skipped { .. } => "SKIP".yellow(),
        StageStatus::Pending | StageStatus::Running => "----".dimmed(),
    }
}

fn stage_line(stage: &StageReport) -> String {
    let elapsed: u64 = stage.results.iter().map(|r| r.duration_ms).sum();
    match &stage.status {
        StageStatus::Skipped { reason } => format!("{} ({reason})", stage.stage_id),
        StageStatus::Pending | StageStatus::Running => format!("{} (not run)", stage.stage_id),
        _ => match &stage.narrowed_to {
            Some(files) => format!("{} ({elapsed}ms, {} changed file(s))", stage.stage_id, files.len()),
            None => format!("{} ({elapsed}ms)", stage.stage_id),
        },
    }
}

fn print_failure(stage: &StageReport) {
    let StageStatus::Failed { failure } = &stage.status else {
        return;
    };
    println!("\n{} {}: {failure}", "Failed stage".red().bold(), stage.stage_id);

    if let Some(result) = stage.failing_result() {
        println!("  exit code: {}", result.exit_code);
        if !result.stdout.is_empty() {
            println!("--- stdout ---");
            print!("{}", result.stdout);
            if !result.stdout.ends_with('\n') {
                println!();
            }
        }
        if !result.stderr.is_empty() {
            println!("--- stderr ---");
            print!("{}", result.stderr);
            if !result.stderr.ends_with('\n') {
                println!();
            }
        }
    }
}

// =============================================================================
// MANIFEST
// =============================================================================

impl ManifestGenerateResult {
    /// Render the result
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => self.render_json(),
        }
    }

    fn render_human(&self) {
        for m in &self.generated {
            println!("Generated {} ({} file(s)) {}", m.unit, m.files, m.unit_digest);
        }
    }

    fn render_json(&self) {
        println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
    }
}

impl UnitCheckResult {
    /// Render the result
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => self.render_json(),
        }
    }

    fn render_human(&self) {
        if self.units.is_empty() {
            println!("No configuration units declared.");
            return;
        }

        for unit in &self.units {
            match &unit.status {
                UnitStatus::Fresh => println!("  {}  {}", "FRESH".green(), unit.unit),
                UnitStatus::Expired { reasons } => {
                    let suffix = if unit.expired { " (deleted)" } else { "" };
                    println!("  {}  {}{suffix}", "EXPIRED".red().bold(), unit.unit);
                    for reason in reasons {
                        println!("           {reason}");
                    }
                },
            }
        }

        let expired = self.units.iter().filter(|u| !u.status.is_fresh()).count();
        if expired > 0 {
            println!("\n{} expired unit(s). Regenerate with: qualities manifest generate --all", expired);
        }
    }

    fn render_json(&self) {
        println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
    }
}

impl ManifestShowResult {
    /// Render the result
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => self.render_json(),
        }
    }

    fn render_human(&self) {
        let Some(manifest) = &self.manifest else {
            match &self.problem {
                Some(problem) => println!("{}: {problem}", self.unit),
                None => println!("{}: no manifest", self.unit),
            }
            return;
        };

        println!("Unit:      {}", manifest.unit);
        println!("Algorithm: {}", manifest.algorithm);
        println!("Generated: {}", manifest.generated_at.to_rfc3339());
        println!("Digest:    {}", manifest.unit_digest);
        println!("Files:");
        for entry in &manifest.files {
            println!("  {}  {}", entry.digest, entry.path);
        }
    }

    fn render_json(&self) {
        println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
    }
}

// =============================================================================
// SCOPE / BASELINE
// =============================================================================

impl ScopeResult {
    /// Render the result
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => self.render_human(),
            OutputMode::Json => self.render_json(),
        }
    }

    fn render_human(&self) {
        match &self.secondary {
            None => println!("No secondary suite configured."),
            Some(scope) => {
                let verdict = if scope.decision.run_secondary_suite {
                    "run".green()
                } else {
                    "skip".yellow()
                };
                println!("Secondary suite: {verdict} ({})", scope.decision.reason);
                match &scope.inputs.changed_paths {
                    Some(paths) => println!("  changed paths: {}", paths.len()),
                    None => println!("  changed paths: unavailable"),
                }
                println!(
                    "  last verified: {}",
                    scope.inputs.last_verified_at.as_deref().unwrap_or("never")
                );
            },
        }

        for stage in &self.narrowed {
            match &stage.files {
                Some(files) => {
                    println!("{}: {} changed file(s)", stage.stage, files.len());
                    for file in files {
                        println!("  {file}");
                    }
                },
                None => println!("{}: full tree", stage.stage),
            }
        }
    }

    fn render_json(&self) {
        println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
    }
}

impl BaselineResult {
    /// Render the result
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => match (&self.last_verified, self.marked) {
                (Some(at), true) => println!("Marked verified at {at}"),
                (Some(at), false) => println!("Last verified: {at}"),
                (None, _) => println!("Never verified."),
            },
            OutputMode::Json => {
                println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
            },
        }
    }
}

impl OperationResult {
    /// Render the result
    pub fn render(&self, mode: OutputMode) {
        match mode {
            OutputMode::Human => println!("{}", self.message),
            OutputMode::Json => {
                println!("{}", serde_json::to_string_pretty(self).unwrap_or_default());
            },
        }
    }
}
