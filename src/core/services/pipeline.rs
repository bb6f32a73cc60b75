//! Pipeline executor
//!
//! Runs the selected stages strictly in list order, one process at a time.
//! A gate run stops at the first failing stage; later stages stay `Pending`
//! and are never invoked. A diagnostics run keeps going and only reports.
//!
//! Per stage:
//! 1. `requires` globs matching nothing: `Skipped`
//! 2. bound configuration unit drifted: `Failed` with `Drift`, no process
//! 3. lint stages may be narrowed to changed files
//! 4. the process runs under its time limit
//! 5. a passing test stage may trigger the secondary suite

use std::time::{Duration, Instant};

use chrono::Utc;

use super::scope::{ScopeProbe, narrow_files, resolve_secondary_suite};
use crate::core::models::{
    DriftStatus, FailureKind, FileScope, FileSelection, PathGlob, PipelineReport,
    RunScope, SecondarySuite, StageDefinition, StageKind, StageReport, StageStatus,
};
use crate::core::ports::{BaselineStore, DriftGate, Invocation, StageRunner, Workspace};

/// Collaborators and settings for one run
#[allow(missing_debug_implementations)]
pub struct PipelineContext<'a> {
    /// Process runner
    pub runner: &'a dyn StageRunner,
    /// Project tree
    pub workspace: &'a dyn Workspace,
    /// Scope evidence
    pub probe: &'a ScopeProbe<'a>,
    /// Last-verified marker, written after the secondary suite passes
    pub baseline: &'a dyn BaselineStore,
    /// Configuration-unit freshness
    pub drift: &'a dyn DriftGate,
    /// Optional secondary test suite
    pub secondary: Option<&'a SecondarySuite>,
    /// Limit for stages without their own
    pub default_timeout: Duration,
    /// Whether lint stages narrow to changed files
    pub file_scope: FileScope,
}

/// Ordered stages plus the scope that selects among them
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<StageDefinition>,
    scope: RunScope,
}

impl Pipeline {
    /// Select the stages taking part in `scope`, keeping their order
    #[must_use]
    pub fn new(stages: &[StageDefinition], scope: RunScope) -> Self {
        Self {
            stages: stages.iter().filter(|s| s.included_in(scope)).cloned().collect(),
            scope,
        }
    }

    /// Selected stages, in execution order
    #[must_use]
    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    /// Run every selected stage
    pub fn run(&self, ctx: &PipelineContext<'_>) -> PipelineReport {
        let start = Instant::now();
        let mut reports: Vec<StageReport> =
            self.stages.iter().map(|s| StageReport::pending(&s.id)).collect();
        let mut diff = DiffCache::default();

        log::info!("{} run: {} stage(s)", self.scope, self.stages.len());

        for (stage, report) in self.stages.iter().zip(reports.iter_mut()) {
            run_stage(stage, report, ctx, &mut diff);
            log::info!("{}: {}", stage.id, report.status.label());

            if report.status.is_failed() && self.scope.is_gate() {
                log::debug!("stopping after failed stage {}", stage.id);
                break;
            }
        }

        let success = !reports.iter().any(|r| r.status.is_failed());
        PipelineReport {
            success,
            stages: reports,
            duration_ms: elapsed_ms(start),
        }
    }
}

/// The diff is queried at most once per run
#[derive(Debug, Default)]
struct DiffCache {
    changed: Option<Option<Vec<String>>>,
}

impl DiffCache {
    fn changed(&mut self, probe: &ScopeProbe<'_>) -> Option<Vec<String>> {
        self.changed.get_or_insert_with(|| probe.changed_paths()).clone()
    }
}

fn run_stage(
    stage: &StageDefinition,
    report: &mut StageReport,
    ctx: &PipelineContext<'_>,
    diff: &mut DiffCache,
) {
    if !stage.requires.is_empty() && !ctx.workspace.any_matches(&stage.requires) {
        report.status = StageStatus::Skipped {
            reason: format!("no files match {}", stage.requires.join(", ")),
        };
        return;
    }

    if stage.has_unit()
        && let DriftStatus::Drift { reasons } = ctx.drift.verify(&stage.config_unit)
    {
        report.status = StageStatus::Failed {
            failure: FailureKind::Drift {
                unit: stage.config_unit.clone(),
                reasons,
            },
        };
        return;
    }

    report.status = StageStatus::Running;
    log::debug!("{}: running", stage.id);

    let mut args = stage.args.clone();
    match select_files(stage, ctx, diff) {
        FileSelection::Changed(files) => {
            args.extend(files.iter().cloned());
            report.narrowed_to = Some(files);
        },
        FileSelection::FullTree => args.extend(stage.targets.iter().cloned()),
    }

    let invocation = Invocation {
        stage_id: stage.id.clone(),
        command: stage.command.clone(),
        args,
        cwd: ctx.workspace.root(),
        timeout: stage.timeout(ctx.default_timeout),
    };
    if let Some(failure) = execute(&invocation, ctx.runner, report) {
        report.status = StageStatus::Failed { failure };
        return;
    }

    if stage.kind == StageKind::Test
        && let Some(suite) = ctx.secondary
        && let Some(failure) = run_secondary(stage, suite, ctx, diff, report)
    {
        report.status = StageStatus::Failed { failure };
        return;
    }

    report.status = StageStatus::Succeeded;
}

/// Run one process, recording its result; returns the failure if any
fn execute(invocation: &Invocation, runner: &dyn StageRunner, report: &mut StageReport) -> Option<FailureKind> {
    match runner.execute(invocation) {
        Ok(result) => {
            let failure = result.failure();
            report.results.push(result);
            failure
        },
        Err(e) => {
            log::warn!("{}: could not start {}: {e:#}", invocation.stage_id, invocation.command);
            Some(FailureKind::SpawnFailed {
                error: format!("{e:#}"),
            })
        },
    }
}

fn select_files(stage: &StageDefinition, ctx: &PipelineContext<'_>, diff: &mut DiffCache) -> FileSelection {
    if stage.kind != StageKind::Lint || ctx.file_scope == FileScope::Full {
        return FileSelection::FullTree;
    }

    let eligible = match PathGlob::compile_all(&stage.files) {
        Ok(globs) => globs,
        Err(e) => {
            log::warn!("{}: ignoring file globs: {e}", stage.id);
            return FileSelection::FullTree;
        },
    };
    let existing = diff.changed(ctx.probe).map(|paths| {
        paths.into_iter().filter(|p| ctx.workspace.file_exists(p)).collect::<Vec<_>>()
    });
    narrow_files(ctx.file_scope, existing.as_deref(), &eligible)
}

fn run_secondary(
    stage: &StageDefinition,
    suite: &SecondarySuite,
    ctx: &PipelineContext<'_>,
    diff: &mut DiffCache,
    report: &mut StageReport,
) -> Option<FailureKind> {
    let inputs = ctx.probe.gather_with(suite, diff.changed(ctx.probe));
    let decision = resolve_secondary_suite(&inputs, suite);
    log::info!(
        "{}: secondary suite {} ({})",
        stage.id,
        if decision.run_secondary_suite { "runs" } else { "skipped" },
        decision.reason
    );
    if !decision.run_secondary_suite {
        return None;
    }

    let invocation = Invocation {
        stage_id: suite.stage_id(&stage.id),
        command: suite.command.clone(),
        args: suite.args.clone(),
        cwd: ctx.workspace.root(),
        timeout: suite.timeout_secs.map_or(ctx.default_timeout, Duration::from_secs),
    };
    let failure = execute(&invocation, ctx.runner, report);
    if failure.is_none()
        && let Err(e) = ctx.baseline.save(Utc::now())
    {
        log::warn!("could not update last-verified marker: {e:#}");
    }
    failure
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
