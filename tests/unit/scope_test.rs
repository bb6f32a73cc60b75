//! Tests for the selective scope resolver

use crate::common::fixtures::secondary_suite;
use crate::common::mocks::{FixedDiff, MemBaseline, MemWorkspace};
use qualities::core::models::{
    DecisionReason, FileScope, FileSelection, PathGlob, ScopeDecisionInputs,
};
use qualities::core::services::{ScopeProbe, narrow_files, resolve_secondary_suite};

fn inputs(
    dir: bool,
    changed: Option<&[&str]>,
    last: Option<&str>,
    newer: Option<bool>,
) -> ScopeDecisionInputs {
    ScopeDecisionInputs {
        suite_dir_exists: dir,
        changed_paths: changed.map(|c| c.iter().map(|p| (*p).to_string()).collect()),
        last_verified_at: last.map(str::to_string),
        any_file_newer_than_last_verified: newer,
    }
}

fn decide(inputs: &ScopeDecisionInputs) -> (bool, DecisionReason) {
    let decision = resolve_secondary_suite(inputs, &secondary_suite());
    (decision.run_secondary_suite, decision.reason)
}

#[test]
fn test_missing_suite_dir_wins_over_everything() {
    for newer in [None, Some(true), Some(false)] {
        let (run, reason) = decide(&inputs(false, Some(&["guarded/tests/x"]), None, newer));
        assert!(!run);
        assert_eq!(reason, DecisionReason::NoSuiteDir);
    }
}

#[test]
fn test_tracked_diff_short_circuits_before_timestamps() {
    assert_eq!(
        decide(&inputs(true, Some(&["guarded/tests/x"]), None, None)),
        (true, DecisionReason::DiffTouchesTrackedPaths)
    );
}

#[test]
fn test_empty_diff_falls_back_to_newer_files() {
    assert_eq!(
        decide(&inputs(true, Some(&[]), Some("2025-01-01T00:00:00Z"), Some(true))),
        (true, DecisionReason::NewerFiles)
    );
}

#[test]
fn test_empty_timestamp_is_absent() {
    assert_eq!(decide(&inputs(true, None, Some(""), None)), (true, DecisionReason::NoBaseline));
}

#[test]
fn test_unavailable_diff_and_nothing_newer_skips() {
    assert_eq!(
        decide(&inputs(true, None, Some("2025-01-01T00:00:00Z"), Some(false))),
        (false, DecisionReason::UpToDate)
    );
}

#[test]
fn test_unknown_freshness_skips() {
    assert_eq!(
        decide(&inputs(true, None, Some("2025-01-01T00:00:00Z"), None)),
        (false, DecisionReason::FreshnessUnknown)
    );
}

#[test]
fn test_probe_gathers_from_ports() {
    let diff = FixedDiff::changed(&["guarded/tests/login.spec.ts"]);
    let workspace = MemWorkspace::new().with_dir("vibecoding").with_newer(Some(false));
    let baseline = MemBaseline::new(Some("2025-01-01T00:00:00Z\n"));

    let probe = ScopeProbe::new(&diff, &workspace, &baseline);
    let gathered = probe.gather(&secondary_suite());

    assert!(gathered.suite_dir_exists);
    assert_eq!(gathered.changed_paths.as_deref().map(<[String]>::len), Some(1));
    assert!(gathered.last_verified_at.as_deref().unwrap().starts_with("2025-01-01T00:00:00"));
    assert!(resolve_secondary_suite(&gathered, &secondary_suite()).run_secondary_suite);
}

#[test]
fn test_probe_changed_files_drops_deleted_paths() {
    let diff = FixedDiff::changed(&["src/kept.ts", "src/deleted.ts"]);
    let workspace = MemWorkspace::new().with_file("src/kept.ts", "x");
    let baseline = MemBaseline::new(None);

    let probe = ScopeProbe::new(&diff, &workspace, &baseline);
    assert_eq!(probe.changed_paths().unwrap().len(), 2);
    assert_eq!(probe.changed_files(), Some(vec!["src/kept.ts".to_string()]));
}

#[test]
fn test_narrowing_uses_eligible_globs() {
    let changed: Vec<String> =
        ["src/a.ts", "docs/readme.md", "src/b.tsx"].iter().map(|p| (*p).to_string()).collect();
    let eligible = PathGlob::compile_all(&["**/*.ts".to_string(), "**/*.tsx".to_string()]).unwrap();

    assert_eq!(
        narrow_files(FileScope::ChangedOnly, Some(&changed), &eligible),
        FileSelection::Changed(vec!["src/a.ts".to_string(), "src/b.tsx".to_string()])
    );
}

#[test]
fn test_narrowing_to_nothing_checks_full_tree() {
    let changed = vec!["docs/readme.md".to_string()];
    let eligible = PathGlob::compile_all(&["**/*.ts".to_string()]).unwrap();
    assert_eq!(
        narrow_files(FileScope::ChangedOnly, Some(&changed), &eligible),
        FileSelection::FullTree
    );
}
