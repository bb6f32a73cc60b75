//! Property-based tests for manifest computation and drift detection

use crate::common::mocks::MemWorkspace;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use qualities::core::models::{DigestAlgorithm, DriftStatus};
use qualities::core::services::{check_drift, compute_manifest};
use std::collections::BTreeMap;

fn file_map() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[a-z]{1,6}(/[a-z]{1,6})?\\.(ts|json)", "[ -~]{0,40}", 1..6)
}

fn workspace(files: &BTreeMap<String, String>) -> MemWorkspace {
    files.iter().fold(MemWorkspace::new(), |ws, (path, content)| ws.with_file(path, content))
}

proptest! {
    /// Recomputing over unchanged files yields the same unit digest
    #[test]
    fn unit_digest_is_idempotent(files in file_map()) {
        let ws = workspace(&files);
        let paths: Vec<String> = files.keys().cloned().collect();
        let first = compute_manifest(&ws, "u", &paths, DigestAlgorithm::Sha256, Utc::now()).unwrap();
        let second = compute_manifest(
            &ws, "u", &paths, DigestAlgorithm::Sha256, Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        ).unwrap();
        prop_assert_eq!(first.unit_digest, second.unit_digest);
    }

    /// Input order does not matter
    #[test]
    fn unit_digest_is_order_independent(files in file_map(), seed in any::<u64>()) {
        let ws = workspace(&files);
        let paths: Vec<String> = files.keys().cloned().collect();
        let mut shuffled = paths.clone();
        let len = shuffled.len();
        shuffled.rotate_left(usize::try_from(seed % len as u64).unwrap());
        shuffled.reverse();

        let a = compute_manifest(&ws, "u", &paths, DigestAlgorithm::Sha256, Utc::now()).unwrap();
        let b = compute_manifest(&ws, "u", &shuffled, DigestAlgorithm::Sha256, Utc::now()).unwrap();
        prop_assert_eq!(a.unit_digest, b.unit_digest);
        prop_assert_eq!(a.files, b.files);
    }

    /// A freshly generated manifest never reports drift, and changing any
    /// one file's content always does
    #[test]
    fn drift_round_trip(files in file_map(), pick in any::<prop::sample::Index>(), extra in "[ -~]{1,8}") {
        let ws = workspace(&files);
        let paths: Vec<String> = files.keys().cloned().collect();
        let manifest = compute_manifest(&ws, "u", &paths, DigestAlgorithm::Sha256, Utc::now()).unwrap();
        prop_assert_eq!(check_drift(&manifest, &paths, &ws, DigestAlgorithm::Sha256), DriftStatus::Ok);

        let victim = &paths[pick.index(paths.len())];
        ws.set_file(victim, &format!("{}{extra}", files[victim]));
        prop_assert!(!check_drift(&manifest, &paths, &ws, DigestAlgorithm::Sha256).is_ok());

        let changed = compute_manifest(&ws, "u", &paths, DigestAlgorithm::Sha256, Utc::now()).unwrap();
        prop_assert_ne!(manifest.unit_digest, changed.unit_digest);
    }
}
