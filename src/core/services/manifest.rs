//! Manifest generation and drift detection
//!
//! A unit's manifest is trusted only while a fresh recomputation agrees with
//! it. Anything that cannot be verified (malformed manifest, unreadable
//! file, other algorithm) counts as drift, and drift expires both the
//! manifest and the unit's context artifact. Expired state is deleted and
//! regenerated, never patched.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::core::models::{
    ConfigUnit, DigestAlgorithm, DriftReason, DriftStatus, ManifestEntry, UnitManifest,
    normalize_path, unit_digest,
};
use crate::core::ports::{ContentReader, ContextArtifacts, DriftGate, ManifestStore, Workspace};

/// Prefix of the stamp line binding a context artifact to a unit digest
const STAMP_PREFIX: &str = "<!-- qualities:manifest ";
const STAMP_SUFFIX: &str = " -->";

/// Errors generating or loading manifests
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Unit has no files to digest
    #[error("unit '{0}' matches no files")]
    EmptyFileSet(String),

    /// Unit id not declared
    #[error("unknown unit: {0}")]
    UnknownUnit(String),

    /// File unreadable while generating
    #[error("cannot read {path}: {source}")]
    Unreadable {
        /// Path of the file
        path: String,
        /// I/O error
        #[source]
        source: std::io::Error,
    },

    /// Manifest or artifact persistence failed
    #[error("{0}")]
    Store(String),
}

/// Whether a unit (manifest plus artifact) can still be trusted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UnitStatus {
    /// Manifest matches live files and the artifact is well-formed
    Fresh,
    /// Must be deleted and regenerated
    Expired {
        /// Why
        reasons: Vec<DriftReason>,
    },
}

impl UnitStatus {
    /// Whether the unit is fresh
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh)
    }
}

/// Compute a manifest over `files`
///
/// Paths are normalized and deduplicated; entries come out sorted by path.
pub fn compute_manifest(
    reader: &dyn ContentReader,
    unit: &str,
    files: &[String],
    algorithm: DigestAlgorithm,
    now: DateTime<Utc>,
) -> Result<UnitManifest, ManifestError> {
    let paths = normalized_set(files);
    if paths.is_empty() {
        return Err(ManifestError::EmptyFileSet(unit.to_string()));
    }

    let mut entries = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = reader.read(Path::new(&path)).map_err(|source| ManifestError::Unreadable {
            path: path.clone(),
            source,
        })?;
        entries.push(ManifestEntry {
            digest: algorithm.hex_digest(&bytes),
            path,
        });
    }

    Ok(UnitManifest {
        unit: unit.to_string(),
        algorithm,
        generated_at: now,
        unit_digest: unit_digest(algorithm, &entries),
        files: entries,
    })
}

/// Parse and validate a stored manifest
///
/// Any failure is reported as a `Malformed` drift reason.
pub fn parse_manifest(raw: &str) -> Result<UnitManifest, DriftReason> {
    let manifest: UnitManifest = serde_json::from_str(raw).map_err(|e| DriftReason::Malformed {
        detail: e.to_string(),
    })?;
    validate_manifest(&manifest).map_err(|detail| DriftReason::Malformed { detail })?;
    Ok(manifest)
}

/// Structural checks on a manifest
pub fn validate_manifest(manifest: &UnitManifest) -> Result<(), String> {
    if manifest.unit.trim().is_empty() {
        return Err("empty unit".to_string());
    }
    if manifest.files.is_empty() {
        return Err("empty file list".to_string());
    }

    let algorithm = manifest.algorithm;
    let mut seen = BTreeSet::new();
    for entry in &manifest.files {
        if normalize_path(Path::new(&entry.path)) != entry.path || entry.path.is_empty() {
            return Err(format!("path not normalized: {}", entry.path));
        }
        if !seen.insert(entry.path.as_str()) {
            return Err(format!("duplicate path: {}", entry.path));
        }
        if !algorithm.is_valid_digest(&entry.digest) {
            return Err(format!("invalid {algorithm} digest for {}", entry.path));
        }
    }
    if !algorithm.is_valid_digest(&manifest.unit_digest) {
        return Err(format!("invalid {algorithm} unit digest"));
    }
    if unit_digest(algorithm, &manifest.files) != manifest.unit_digest {
        return Err("unitDigest does not match files".to_string());
    }
    Ok(())
}

/// Compare a stored manifest against the live file set
///
/// A manifest freshly computed from the same files is always `Ok`.
pub fn check_drift(
    stored: &UnitManifest,
    live_files: &[String],
    reader: &dyn ContentReader,
    expected: DigestAlgorithm,
) -> DriftStatus {
    if let Err(detail) = validate_manifest(stored) {
        return DriftStatus::drift(DriftReason::Malformed { detail });
    }
    if stored.algorithm != expected {
        return DriftStatus::drift(DriftReason::AlgorithmMismatch {
            stored: stored.algorithm,
            expected,
        });
    }

    let live = normalized_set(live_files);
    let mut reasons = Vec::new();
    let mut entries = Vec::with_capacity(live.len());
    for path in &live {
        match reader.read(Path::new(path)) {
            Ok(bytes) => entries.push(ManifestEntry {
                path: path.clone(),
                digest: expected.hex_digest(&bytes),
            }),
            Err(e) => reasons.push(DriftReason::Unreadable {
                path: path.clone(),
                error: e.to_string(),
            }),
        }
    }

    if reasons.is_empty() && unit_digest(expected, &entries) == stored.unit_digest {
        return DriftStatus::Ok;
    }

    reasons.extend(diff_entries(&stored.files, &live, &entries));
    if reasons.is_empty() {
        reasons.push(DriftReason::Malformed {
            detail: "unitDigest does not match live files".to_string(),
        });
    }
    DriftStatus::Drift { reasons }
}

/// Drift status from the raw stored text (`None` when nothing is stored)
pub fn check_stored(
    raw: Option<&str>,
    live_files: &[String],
    reader: &dyn ContentReader,
    expected: DigestAlgorithm,
) -> DriftStatus {
    let Some(raw) = raw else {
        return DriftStatus::drift(DriftReason::Missing);
    };
    match parse_manifest(raw) {
        Ok(stored) => check_drift(&stored, live_files, reader, expected),
        Err(reason) => DriftStatus::drift(reason),
    }
}

fn diff_entries(
    stored: &[ManifestEntry],
    live: &BTreeSet<String>,
    live_entries: &[ManifestEntry],
) -> Vec<DriftReason> {
    let stored_map: BTreeMap<&str, &str> =
        stored.iter().map(|e| (e.path.as_str(), e.digest.as_str())).collect();

    let added: Vec<String> =
        live.iter().filter(|p| !stored_map.contains_key(p.as_str())).cloned().collect();
    let removed: Vec<String> = stored_map
        .keys()
        .filter(|p| !live.contains(**p))
        .map(|p| (*p).to_string())
        .collect();
    let changed: Vec<String> = live_entries
        .iter()
        .filter(|e| stored_map.get(e.path.as_str()).is_some_and(|d| *d != e.digest))
        .map(|e| e.path.clone())
        .collect();

    let mut reasons = Vec::new();
    if !added.is_empty() {
        reasons.push(DriftReason::FilesAdded { paths: added });
    }
    if !removed.is_empty() {
        reasons.push(DriftReason::FilesRemoved { paths: removed });
    }
    if !changed.is_empty() {
        reasons.push(DriftReason::ContentChanged { paths: changed });
    }
    reasons
}

fn normalized_set(files: &[String]) -> BTreeSet<String> {
    files
        .iter()
        .map(|f| normalize_path(Path::new(f)))
        .filter(|p| !p.is_empty())
        .collect()
}

// =============================================================================
// CONTEXT ARTIFACTS
// =============================================================================

/// Structural problems in a context artifact
///
/// Each required section may appear at most once, and at most one manifest
/// stamp may be present. A single stamp must carry `live_digest` when given.
#[must_use]
pub fn check_artifact(text: &str, sections: &[String], live_digest: Option<&str>) -> Vec<DriftReason> {
    let mut reasons = Vec::new();

    let titles = heading_titles(text);
    for section in sections {
        let count = titles.iter().filter(|t| t.eq_ignore_ascii_case(section)).count();
        if count > 1 {
            reasons.push(DriftReason::DuplicateSection {
                section: section.clone(),
                count,
            });
        }
    }

    let stamps: Vec<&str> = text.lines().filter_map(stamp_digest).collect();
    match stamps.as_slice() {
        [] => {},
        [recorded] => {
            if let Some(live) = live_digest.filter(|live| live != recorded) {
                reasons.push(DriftReason::StaleArtifact {
                    recorded: (*recorded).to_string(),
                    live: live.to_string(),
                });
            }
        },
        _ => reasons.push(DriftReason::DuplicateManifest { count: stamps.len() }),
    }

    reasons
}

/// Replace any stamp lines with a single stamp for `digest`
#[must_use]
pub fn stamp_artifact(text: &str, digest: &str) -> String {
    let mut out: Vec<&str> = text.lines().filter(|line| stamp_digest(line).is_none()).collect();
    while out.last().is_some_and(|line| line.trim().is_empty()) {
        out.pop();
    }
    let stamp = format!("{STAMP_PREFIX}{digest}{STAMP_SUFFIX}");
    let mut result = out.join("\n");
    if !result.is_empty() {
        result.push_str("\n\n");
    }
    result.push_str(&stamp);
    result.push('\n');
    result
}

/// Titles of the headings outside fenced code blocks
fn heading_titles(text: &str) -> Vec<&str> {
    let mut fence: Option<(u8, usize)> = None;
    let mut titles = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        let marker = trimmed.bytes().next().filter(|b| matches!(b, b'`' | b'~'));
        let run = marker.map_or(0, |m| trimmed.bytes().take_while(|b| *b == m).count());
        match (fence, marker) {
            (None, Some(m)) if run >= 3 => fence = Some((m, run)),
            (Some((open, len)), Some(m)) if m == open && run >= len && trimmed[run..].trim().is_empty() => {
                fence = None;
            },
            (None, _) => titles.extend(heading_title(line)),
            _ => {},
        }
    }
    titles
}

fn heading_title(line: &str) -> Option<&str> {
    let trimmed = line.trim_start();
    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some(rest.trim().trim_end_matches('#').trim())
}

fn stamp_digest(line: &str) -> Option<&str> {
    line.trim().strip_prefix(STAMP_PREFIX)?.strip_suffix(STAMP_SUFFIX).map(str::trim)
}

// =============================================================================
// UNIT VERIFICATION
// =============================================================================

/// Everything a unit's freshness is judged from
#[derive(Debug, Clone, Copy)]
pub struct UnitEvidence<'a> {
    /// Unit being verified
    pub unit: &'a str,
    /// Raw stored manifest, if any
    pub stored: Option<&'a str>,
    /// Files the unit currently consists of
    pub live_files: &'a [String],
    /// Context artifact text, if the unit has one and it exists
    pub artifact: Option<&'a str>,
    /// Required artifact sections
    pub sections: &'a [String],
}

/// Combine drift and artifact structure into a single status
///
/// A stored manifest recorded for a different unit counts as malformed.
pub fn verify_unit(
    evidence: &UnitEvidence<'_>,
    reader: &dyn ContentReader,
    algorithm: DigestAlgorithm,
) -> UnitStatus {
    let stored = evidence.stored.map(parse_manifest);
    let drift = match &stored {
        None => DriftStatus::drift(DriftReason::Missing),
        Some(Err(reason)) => DriftStatus::drift(reason.clone()),
        Some(Ok(manifest)) if manifest.unit != evidence.unit => {
            DriftStatus::drift(DriftReason::Malformed {
                detail: format!("manifest belongs to unit {}", manifest.unit),
            })
        },
        Some(Ok(manifest)) => check_drift(manifest, evidence.live_files, reader, algorithm),
    };
    let mut reasons = drift.reasons().to_vec();

    if let Some(artifact) = evidence.artifact {
        // The stamp can only be compared while the manifest itself holds.
        let live_digest = match &stored {
            Some(Ok(manifest)) if drift.is_ok() => Some(manifest.unit_digest.as_str()),
            _ => None,
        };
        reasons.extend(check_artifact(artifact, evidence.sections, live_digest));
    }

    if reasons.is_empty() {
        UnitStatus::Fresh
    } else {
        UnitStatus::Expired { reasons }
    }
}

/// Unit operations against the project's stores
///
/// Also serves as the pipeline's drift gate: verifying an expired unit
/// deletes its manifest and artifact.
#[allow(missing_debug_implementations)]
pub struct UnitVerifier<'a> {
    /// Declared units
    pub units: &'a [ConfigUnit],
    /// File listing
    pub workspace: &'a dyn Workspace,
    /// File content
    pub reader: &'a dyn ContentReader,
    /// Manifest persistence
    pub store: &'a dyn ManifestStore,
    /// Context artifact persistence
    pub artifacts: &'a dyn ContextArtifacts,
    /// Project digest algorithm
    pub algorithm: DigestAlgorithm,
}

impl UnitVerifier<'_> {
    /// Declared unit by id
    pub fn unit(&self, id: &str) -> Result<&ConfigUnit, ManifestError> {
        self.units
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| ManifestError::UnknownUnit(id.to_string()))
    }

    /// Files the unit currently consists of
    pub fn live_files(&self, unit: &ConfigUnit) -> Result<Vec<String>, ManifestError> {
        self.workspace.list_matching(&unit.files).map_err(|e| ManifestError::Store(e.to_string()))
    }

    /// Compute and store a new manifest, restamping the artifact if present
    pub fn generate(&self, id: &str, now: DateTime<Utc>) -> Result<UnitManifest, ManifestError> {
        let unit = self.unit(id)?;
        let files = self.live_files(unit)?;
        let manifest = compute_manifest(self.reader, id, &files, self.algorithm, now)?;
        self.store.save(&manifest).map_err(|e| ManifestError::Store(e.to_string()))?;

        if let Some(path) = &unit.context {
            let existing = self.artifacts.read(path).map_err(|e| ManifestError::Store(e.to_string()))?;
            if let Some(text) = existing {
                let stamped = stamp_artifact(&text, &manifest.unit_digest);
                self.artifacts
                    .write(path, &stamped)
                    .map_err(|e| ManifestError::Store(e.to_string()))?;
            }
        }

        log::info!("generated manifest for {id} ({} files)", manifest.files.len());
        Ok(manifest)
    }

    /// Current status, without deleting anything
    pub fn status(&self, id: &str) -> Result<UnitStatus, ManifestError> {
        let unit = self.unit(id)?;
        let live_files = self.live_files(unit)?;
        let stored = self.store.load(id).map_err(|e| ManifestError::Store(e.to_string()))?;
        let artifact = match &unit.context {
            Some(path) => self.artifacts.read(path).map_err(|e| ManifestError::Store(e.to_string()))?,
            None => None,
        };

        let evidence = UnitEvidence {
            unit: id,
            stored: stored.as_deref(),
            live_files: &live_files,
            artifact: artifact.as_deref(),
            sections: &unit.sections,
        };
        Ok(verify_unit(&evidence, self.reader, self.algorithm))
    }

    /// Delete the unit's manifest and artifact
    pub fn expire(&self, id: &str) -> Result<(), ManifestError> {
        let unit = self.unit(id)?;
        self.store.expire(id).map_err(|e| ManifestError::Store(e.to_string()))?;
        if let Some(path) = &unit.context {
            self.artifacts.remove(path).map_err(|e| ManifestError::Store(e.to_string()))?;
        }
        log::info!("expired unit {id}");
        Ok(())
    }
}

impl DriftGate for UnitVerifier<'_> {
    fn verify(&self, unit: &str) -> DriftStatus {
        let status = match self.status(unit) {
            Ok(status) => status,
            Err(e) => UnitStatus::Expired {
                reasons: vec![DriftReason::Malformed {
                    detail: e.to_string(),
                }],
            },
        };

        match status {
            UnitStatus::Fresh => DriftStatus::Ok,
            UnitStatus::Expired { reasons } => {
                if let Err(e) = self.expire(unit) {
                    log::warn!("could not expire unit {unit}: {e}");
                }
                DriftStatus::Drift { reasons }
            },
        }
    }
}
