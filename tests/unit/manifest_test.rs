//! Tests for manifest generation, drift detection and unit expiry

use crate::common::mocks::{MemArtifacts, MemManifestStore, MemWorkspace};
use chrono::{TimeZone, Utc};
use qualities::core::models::{ConfigUnit, DigestAlgorithm, DriftReason, DriftStatus};
use qualities::core::ports::{ContextArtifacts, DriftGate};
use qualities::core::services::{
    ManifestError, UnitStatus, UnitVerifier, check_drift, check_stored, compute_manifest,
    stamp_artifact,
};

fn files(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| (*p).to_string()).collect()
}

fn lint_workspace() -> MemWorkspace {
    MemWorkspace::new()
        .with_file("eslint.config.js", "export default [];\n")
        .with_file("tsconfig.json", "{ \"strict\": true }\n")
}

#[test]
fn test_fresh_manifest_has_no_drift() {
    let workspace = lint_workspace();
    let live = files(&["tsconfig.json", "eslint.config.js"]);
    let manifest =
        compute_manifest(&workspace, "lint", &live, DigestAlgorithm::Sha256, Utc::now()).unwrap();

    assert_eq!(manifest.files[0].path, "eslint.config.js");
    assert_eq!(manifest.unit_digest.len(), 64);
    assert_eq!(check_drift(&manifest, &live, &workspace, DigestAlgorithm::Sha256), DriftStatus::Ok);
}

#[test]
fn test_sha512_digests_are_128_hex_chars() {
    let workspace = lint_workspace();
    let manifest = compute_manifest(
        &workspace,
        "lint",
        &files(&["tsconfig.json"]),
        DigestAlgorithm::Sha512,
        Utc::now(),
    )
    .unwrap();
    assert_eq!(manifest.files[0].digest.len(), 128);
    assert!(manifest.unit_digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn test_content_change_lists_changed_path() {
    let workspace = lint_workspace();
    let live = files(&["eslint.config.js", "tsconfig.json"]);
    let manifest =
        compute_manifest(&workspace, "lint", &live, DigestAlgorithm::Sha256, Utc::now()).unwrap();

    workspace.set_file("tsconfig.json", "{ \"strict\": false }\n");
    let status = check_drift(&manifest, &live, &workspace, DigestAlgorithm::Sha256);

    assert_eq!(
        status.reasons(),
        &[DriftReason::ContentChanged {
            paths: files(&["tsconfig.json"])
        }]
    );
}

#[test]
fn test_added_and_removed_files_are_drift() {
    let workspace = lint_workspace().with_file(".prettierrc", "{}\n");
    let before = files(&["eslint.config.js", "tsconfig.json"]);
    let manifest =
        compute_manifest(&workspace, "lint", &before, DigestAlgorithm::Sha256, Utc::now()).unwrap();

    let after = files(&["eslint.config.js", ".prettierrc"]);
    let status = check_drift(&manifest, &after, &workspace, DigestAlgorithm::Sha256);

    assert!(status.reasons().contains(&DriftReason::FilesAdded {
        paths: files(&[".prettierrc"])
    }));
    assert!(status.reasons().contains(&DriftReason::FilesRemoved {
        paths: files(&["tsconfig.json"])
    }));
}

#[test]
fn test_unreadable_live_file_is_drift() {
    let workspace = lint_workspace();
    let live = files(&["eslint.config.js", "tsconfig.json"]);
    let manifest =
        compute_manifest(&workspace, "lint", &live, DigestAlgorithm::Sha256, Utc::now()).unwrap();

    workspace.remove_file("tsconfig.json");
    let status = check_drift(&manifest, &live, &workspace, DigestAlgorithm::Sha256);
    assert!(matches!(status.reasons().first(), Some(DriftReason::Unreadable { path, .. }) if path == "tsconfig.json"));
}

#[test]
fn test_algorithm_mismatch_is_drift() {
    let workspace = lint_workspace();
    let live = files(&["tsconfig.json"]);
    let manifest =
        compute_manifest(&workspace, "lint", &live, DigestAlgorithm::Sha256, Utc::now()).unwrap();

    let status = check_drift(&manifest, &live, &workspace, DigestAlgorithm::Sha512);
    assert!(matches!(status.reasons(), [DriftReason::AlgorithmMismatch { .. }]));
}

#[test]
fn test_missing_and_malformed_stored_manifests() {
    let workspace = lint_workspace();
    let live = files(&["tsconfig.json"]);

    assert_eq!(
        check_stored(None, &live, &workspace, DigestAlgorithm::Sha256),
        DriftStatus::drift(DriftReason::Missing)
    );

    for raw in [
        "not json",
        r#"{"unit":"lint","algorithm":"sha256","generatedAt":"2025-01-01T00:00:00Z","unitDigest":"abc","files":[]}"#,
        r#"{"unit":"lint","algorithm":"md5","generatedAt":"2025-01-01T00:00:00Z","unitDigest":"abc","files":[]}"#,
    ] {
        let status = check_stored(Some(raw), &live, &workspace, DigestAlgorithm::Sha256);
        assert!(
            matches!(status.reasons(), [DriftReason::Malformed { .. }]),
            "expected malformed for {raw}"
        );
    }
}

#[test]
fn test_tampered_unit_digest_is_malformed() {
    let workspace = lint_workspace();
    let live = files(&["tsconfig.json"]);
    let mut manifest =
        compute_manifest(&workspace, "lint", &live, DigestAlgorithm::Sha256, Utc::now()).unwrap();
    manifest.unit_digest = "0".repeat(64);

    let raw = serde_json::to_string(&manifest).unwrap();
    let status = check_stored(Some(&raw), &live, &workspace, DigestAlgorithm::Sha256);
    assert!(matches!(status.reasons(), [DriftReason::Malformed { .. }]));
}

#[test]
fn test_manifest_json_uses_camel_case_keys() {
    let workspace = lint_workspace();
    let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let manifest =
        compute_manifest(&workspace, "lint", &files(&["tsconfig.json"]), DigestAlgorithm::Sha256, at)
            .unwrap();
    let json: serde_json::Value = serde_json::to_value(&manifest).unwrap();

    assert_eq!(json["unit"], "lint");
    assert_eq!(json["algorithm"], "sha256");
    assert!(json["generatedAt"].as_str().unwrap().starts_with("2025-01-01T00:00:00"));
    assert!(json["unitDigest"].is_string());
    assert_eq!(json["files"][0]["path"], "tsconfig.json");
}

#[test]
fn test_empty_file_set_cannot_be_generated() {
    let workspace = MemWorkspace::new();
    let result = compute_manifest(&workspace, "lint", &[], DigestAlgorithm::Sha256, Utc::now());
    assert!(matches!(result, Err(ManifestError::EmptyFileSet(_))));
}

// =============================================================================
// UNIT VERIFIER
// =============================================================================

struct Units {
    units: Vec<ConfigUnit>,
    workspace: MemWorkspace,
    store: MemManifestStore,
    artifacts: MemArtifacts,
}

impl Units {
    fn new(artifact: Option<&str>) -> Self {
        let artifacts = match artifact {
            Some(text) => MemArtifacts::new().with("docs/lint.md", text),
            None => MemArtifacts::new(),
        };
        Self {
            units: vec![
                ConfigUnit::new("lint", &["eslint.config.js", "tsconfig.json"])
                    .with_context("docs/lint.md"),
            ],
            workspace: lint_workspace(),
            store: MemManifestStore::new(),
            artifacts,
        }
    }

    fn verifier(&self) -> UnitVerifier<'_> {
        UnitVerifier {
            units: &self.units,
            workspace: &self.workspace,
            reader: &self.workspace,
            store: &self.store,
            artifacts: &self.artifacts,
            algorithm: DigestAlgorithm::Sha256,
        }
    }
}

#[test]
fn test_generate_stamps_artifact_and_is_fresh() {
    let units = Units::new(Some("# Why\nBecause.\n\n# How\nLike this.\n"));
    let manifest = units.verifier().generate("lint", Utc::now()).unwrap();

    let artifact = units.artifacts.get("docs/lint.md").unwrap();
    assert!(artifact.ends_with(&format!("<!-- qualities:manifest {} -->\n", manifest.unit_digest)));
    assert_eq!(units.verifier().status("lint").unwrap(), UnitStatus::Fresh);
    assert_eq!(units.verifier().verify("lint"), DriftStatus::Ok);
}

#[test]
fn test_drift_gate_expires_manifest_and_artifact() {
    let units = Units::new(Some("# Why\n"));
    units.verifier().generate("lint", Utc::now()).unwrap();
    units.workspace.set_file("eslint.config.js", "export default [{ rules: {} }];\n");

    let status = units.verifier().verify("lint");

    assert!(!status.is_ok());
    assert!(!units.store.contains("lint"));
    assert!(units.artifacts.get("docs/lint.md").is_none());
}

#[test]
fn test_status_does_not_delete() {
    let units = Units::new(None);
    assert_eq!(
        units.verifier().status("lint").unwrap(),
        UnitStatus::Expired {
            reasons: vec![DriftReason::Missing]
        }
    );

    units.verifier().generate("lint", Utc::now()).unwrap();
    units.workspace.set_file("tsconfig.json", "{}\n");
    assert!(!units.verifier().status("lint").unwrap().is_fresh());
    assert!(units.store.contains("lint"));
}

#[test]
fn test_duplicate_sections_expire_the_artifact() {
    let units = Units::new(Some("# Why\nOne.\n\n## Why\nTwo.\n"));
    units.verifier().generate("lint", Utc::now()).unwrap();

    let status = units.verifier().status("lint").unwrap();
    assert_eq!(
        status,
        UnitStatus::Expired {
            reasons: vec![DriftReason::DuplicateSection {
                section: "Why".to_string(),
                count: 2
            }]
        }
    );
}

#[test]
fn test_stale_or_doubled_stamp_expires_the_artifact() {
    let units = Units::new(Some("# Why\n"));
    let manifest = units.verifier().generate("lint", Utc::now()).unwrap();

    let stale = stamp_artifact("# Why\n", &"f".repeat(64));
    units.artifacts.write("docs/lint.md", &stale).unwrap();
    assert!(matches!(
        units.verifier().status("lint").unwrap(),
        UnitStatus::Expired { reasons } if matches!(reasons.as_slice(), [DriftReason::StaleArtifact { .. }])
    ));

    let doubled = format!(
        "{}<!-- qualities:manifest {} -->\n",
        stamp_artifact("# Why\n", &manifest.unit_digest),
        manifest.unit_digest
    );
    units.artifacts.write("docs/lint.md", &doubled).unwrap();
    assert!(matches!(
        units.verifier().status("lint").unwrap(),
        UnitStatus::Expired { reasons } if matches!(reasons.as_slice(), [DriftReason::DuplicateManifest { count: 2 }])
    ));
}

#[test]
fn test_stamping_replaces_existing_stamps() {
    let once = stamp_artifact("# What\nText\n", "aaa");
    let twice = stamp_artifact(&once, "bbb");
    assert_eq!(twice, "# What\nText\n\n<!-- qualities:manifest bbb -->\n");
}

#[test]
fn test_unknown_unit() {
    let units = Units::new(None);
    assert!(matches!(units.verifier().status("nope"), Err(ManifestError::UnknownUnit(_))));
}

#[test]
fn test_manifest_recorded_for_another_unit_is_not_fresh() {
    let mut units = Units::new(None);
    units.units.push(ConfigUnit::new("lint-copy", &["eslint.config.js", "tsconfig.json"]));
    let manifest = units.verifier().generate("lint", Utc::now()).unwrap();
    units.store.put_raw("lint-copy", &serde_json::to_string(&manifest).unwrap());

    assert_eq!(
        units.verifier().status("lint-copy").unwrap(),
        UnitStatus::Expired {
            reasons: vec![DriftReason::Malformed {
                detail: "manifest belongs to unit lint".to_string()
            }]
        }
    );
    assert!(!units.verifier().verify("lint-copy").is_ok());
    assert!(!units.store.contains("lint-copy"));
    assert!(units.store.contains("lint"));
}

#[test]
fn test_fenced_example_heading_does_not_expire_the_artifact() {
    let units = Units::new(Some("# Why\nRun it like this:\n\n```sh\n# Why\nnpm run lint\n```\n"));
    units.verifier().generate("lint", Utc::now()).unwrap();
    assert_eq!(units.verifier().status("lint").unwrap(), UnitStatus::Fresh);
}
