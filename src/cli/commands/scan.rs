//! Scan source files for banned patterns

use qualities::adapters::apply_fixes;
use qualities::core::models::{FileScope, FileSelection, PathGlob};
use qualities::core::ports::Workspace;
use qualities::core::services::{self, RuleSet, ScopeProbe, narrow_files, plan_fixes};
use qualities::output::{OutputMode, ScanResult};

use super::project::Project;

/// Scan `paths` (or the project's sources) with the configured rules
pub fn scan(
    paths: &[String],
    only_rules: &[String],
    changed_only: bool,
    fix: bool,
    mode: OutputMode,
) -> anyhow::Result<()> {
    let project = Project::load()?;

    let mut rules = RuleSet::build(&project.config.rules, &project.config.locale())?;
    if !only_rules.is_empty() {
        rules.retain_ids(only_rules)?;
    }

    let files = select_files(&project, paths, changed_only)?;
    log::debug!("scanning {} file(s) with {} rule(s)", files.len(), rules.rules().len());

    let (report, sources) = services::scan(&rules, &project.reader, &files);

    let fixes = if fix {
        let planned = plan_fixes(&sources, &report.violations, &rules);
        apply_fixes(&project.root, &planned)?;
        planned
    } else {
        Vec::new()
    };

    let result = ScanResult {
        passed: report.passed(),
        files_scanned: report.files_scanned,
        violations: report.violations,
        skipped: report.skipped,
        fixes,
    };
    result.render(mode);

    if !result.passed {
        std::process::exit(1);
    }

    Ok(())
}

/// Explicit paths win; otherwise the project's source globs, optionally
/// narrowed to changed files
fn select_files(project: &Project, paths: &[String], changed_only: bool) -> anyhow::Result<Vec<String>> {
    if !paths.is_empty() {
        return Ok(paths.to_vec());
    }

    let sources = &project.config.project.sources;
    if changed_only {
        let probe = ScopeProbe::new(&project.diff, &project.workspace, &project.baseline);
        let eligible = PathGlob::compile_all(sources)?;
        let changed = probe.changed_files();
        if let FileSelection::Changed(files) =
            narrow_files(FileScope::ChangedOnly, changed.as_deref(), &eligible)
        {
            return Ok(files);
        }
    }

    project.workspace.list_matching(sources)
}
