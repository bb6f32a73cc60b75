//! Run the pipeline

use qualities::adapters::ProcessRunner;
use qualities::core::models::{FileScope, RunScope};
use qualities::core::services::{Pipeline, PipelineContext, ScopeProbe};
use qualities::output::{OutputMode, RunResult};

use super::project::Project;

/// Run the stages selected by `scope`
///
/// Gate runs exit non-zero on the first failing stage; diagnostics runs
/// always exit zero.
pub fn run(scope: RunScope, changed_only: bool, mode: OutputMode) -> anyhow::Result<()> {
    let project = Project::load()?;
    let runner = ProcessRunner::new()?;
    let verifier = project.verifier();
    let probe = ScopeProbe::new(&project.diff, &project.workspace, &project.baseline);

    let ctx = PipelineContext {
        runner: &runner,
        workspace: &project.workspace,
        probe: &probe,
        baseline: &project.baseline,
        drift: &verifier,
        secondary: project.config.secondary.as_ref(),
        default_timeout: project.config.default_timeout(),
        file_scope: if changed_only {
            FileScope::ChangedOnly
        } else {
            FileScope::Full
        },
    };

    let pipeline = Pipeline::new(&project.config.stages, scope);
    if pipeline.stages().is_empty() {
        log::warn!("no stages selected for a {scope} run");
    }
    let report = pipeline.run(&ctx);
    let success = report.success;

    RunResult { scope, report }.render(mode);

    if !success && scope.is_gate() {
        std::process::exit(1);
    }

    Ok(())
}
