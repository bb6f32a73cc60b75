//! Selective scope resolution
//!
//! [`resolve_secondary_suite`] and [`narrow_files`] are pure. [`ScopeProbe`]
//! is the only part that talks to the outside world, and it only gathers
//! evidence; it never decides.

use chrono::DateTime;

use crate::core::models::{
    DecisionReason, FileScope, FileSelection, PathGlob, ScopeDecision, ScopeDecisionInputs,
    SecondarySuite,
};
use crate::core::ports::{BaselineStore, DiffProvider, Workspace};

/// Decide whether the secondary suite runs
///
/// Precedence, first match wins:
/// 1. no suite directory: skip
/// 2. diff available and touching a tracked subtree: run
/// 3. no (or empty) baseline: run
/// 4. freshness unknown: skip
/// 5. otherwise: run iff tracked files are newer than the baseline
#[must_use]
pub fn resolve_secondary_suite(inputs: &ScopeDecisionInputs, suite: &SecondarySuite) -> ScopeDecision {
    let decide = |run_secondary_suite, reason| ScopeDecision {
        run_secondary_suite,
        reason,
    };

    if !inputs.suite_dir_exists {
        return decide(false, DecisionReason::NoSuiteDir);
    }

    let diff_touches_tracked = inputs
        .changed_paths
        .as_ref()
        .is_some_and(|changed| changed.iter().any(|path| suite.tracks(path)));
    if diff_touches_tracked {
        return decide(true, DecisionReason::DiffTouchesTrackedPaths);
    }

    if inputs.last_verified_at.as_deref().is_none_or(|at| at.trim().is_empty()) {
        return decide(true, DecisionReason::NoBaseline);
    }

    match inputs.any_file_newer_than_last_verified {
        None => decide(false, DecisionReason::FreshnessUnknown),
        Some(true) => decide(true, DecisionReason::NewerFiles),
        Some(false) => decide(false, DecisionReason::UpToDate),
    }
}

/// Choose the input set for a lint-like check
///
/// Changed-only mode narrows to changed files matching `eligible` (all
/// changed files when `eligible` is empty). An unavailable diff or an empty
/// narrowed set falls back to the full tree.
#[must_use]
pub fn narrow_files(scope: FileScope, changed: Option<&[String]>, eligible: &[PathGlob]) -> FileSelection {
    if scope == FileScope::Full {
        return FileSelection::FullTree;
    }

    let Some(changed) = changed else {
        log::debug!("diff unavailable, checking the full tree");
        return FileSelection::FullTree;
    };

    let mut files: Vec<String> = changed
        .iter()
        .filter(|path| eligible.is_empty() || PathGlob::any_match(eligible, path))
        .cloned()
        .collect();
    files.sort();
    files.dedup();

    if files.is_empty() {
        log::debug!("no eligible changed files, checking the full tree");
        FileSelection::FullTree
    } else {
        FileSelection::Changed(files)
    }
}

/// Gathers scope evidence from the diff, the workspace, and the baseline
#[allow(missing_debug_implementations)]
pub struct ScopeProbe<'a> {
    diff: &'a dyn DiffProvider,
    workspace: &'a dyn Workspace,
    baseline: &'a dyn BaselineStore,
}

impl<'a> ScopeProbe<'a> {
    /// Create a probe over the given sources
    #[must_use]
    pub fn new(
        diff: &'a dyn DiffProvider,
        workspace: &'a dyn Workspace,
        baseline: &'a dyn BaselineStore,
    ) -> Self {
        Self {
            diff,
            workspace,
            baseline,
        }
    }

    /// Changed paths, `None` when the diff is unavailable
    #[must_use]
    pub fn changed_paths(&self) -> Option<Vec<String>> {
        match self.diff.changed_paths() {
            Ok(paths) => Some(paths),
            Err(e) => {
                log::debug!("diff unavailable: {e:#}");
                None
            },
        }
    }

    /// Changed paths that still exist as files
    #[must_use]
    pub fn changed_files(&self) -> Option<Vec<String>> {
        self.changed_paths()
            .map(|paths| paths.into_iter().filter(|p| self.workspace.file_exists(p)).collect())
    }

    /// Gather every input of the secondary-suite decision
    #[must_use]
    pub fn gather(&self, suite: &SecondarySuite) -> ScopeDecisionInputs {
        self.gather_with(suite, self.changed_paths())
    }

    /// Gather inputs, reusing an already-computed diff
    #[must_use]
    pub fn gather_with(
        &self,
        suite: &SecondarySuite,
        changed_paths: Option<Vec<String>>,
    ) -> ScopeDecisionInputs {
        let stored = match self.baseline.load() {
            Ok(stored) => stored.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) => {
                log::warn!("cannot read last-verified marker: {e:#}");
                None
            },
        };

        let parsed = stored.as_deref().and_then(|raw| match DateTime::parse_from_rfc3339(raw) {
            Ok(at) => Some(at.to_utc()),
            Err(e) => {
                log::warn!("ignoring unparsable last-verified marker '{raw}': {e}");
                None
            },
        });

        let any_newer = parsed
            .and_then(|since| self.workspace.any_modified_after(&suite.tracked_prefixes(), since));

        ScopeDecisionInputs {
            suite_dir_exists: self.workspace.dir_exists(&suite.dir),
            changed_paths,
            last_verified_at: parsed.map(|at| at.to_rfc3339()),
            any_file_newer_than_last_verified: any_newer,
        }
    }
}
