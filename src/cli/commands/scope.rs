//! Show the scope decisions a run would make

use qualities::core::models::{FileScope, PathGlob, StageKind};
use qualities::core::ports::Workspace;
use qualities::core::services::{ScopeProbe, narrow_files, resolve_secondary_suite};
use qualities::output::{NarrowedStage, OutputMode, ScopeResult, SecondaryScope};

use super::project::Project;

/// Print the secondary-suite decision and, with `changed_only`, the narrowed
/// lint file sets
pub fn scope(changed_only: bool, mode: OutputMode) -> anyhow::Result<()> {
    let project = Project::load()?;
    let probe = ScopeProbe::new(&project.diff, &project.workspace, &project.baseline);
    let changed = probe.changed_paths();

    let secondary = project.config.secondary.as_ref().map(|suite| {
        let inputs = probe.gather_with(suite, changed.clone());
        let decision = resolve_secondary_suite(&inputs, suite);
        SecondaryScope { inputs, decision }
    });

    let mut narrowed = Vec::new();
    if changed_only {
        let existing: Option<Vec<String>> = changed.as_ref().map(|paths| {
            paths.iter().filter(|p| project.workspace.file_exists(p)).cloned().collect()
        });
        for stage in project.config.stages.iter().filter(|s| s.kind == StageKind::Lint) {
            let eligible = PathGlob::compile_all(&stage.files)?;
            let selection = narrow_files(FileScope::ChangedOnly, existing.as_deref(), &eligible);
            narrowed.push(NarrowedStage {
                stage: stage.id.clone(),
                files: selection.files().map(<[String]>::to_vec),
            });
        }
    }

    ScopeResult { secondary, narrowed }.render(mode);
    Ok(())
}
