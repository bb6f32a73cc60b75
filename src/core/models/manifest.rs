//! Manifest model
//!
//! A manifest records a content digest for every file of a configuration
//! unit, plus a digest over those digests. The unit digest is what makes
//! "did anything in this unit change" a cheap question.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};

/// Content digest algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256, 64 hex characters
    #[default]
    Sha256,
    /// SHA-512, 128 hex characters
    Sha512,
}

impl DigestAlgorithm {
    /// Lowercase hex digest of `bytes`
    #[must_use]
    pub fn hex_digest(self, bytes: &[u8]) -> String {
        match self {
            Self::Sha256 => hex::encode(Sha256::digest(bytes)),
            Self::Sha512 => hex::encode(Sha512::digest(bytes)),
        }
    }

    /// Length of a hex digest produced by this algorithm
    #[must_use]
    pub const fn hex_len(self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha512 => 128,
        }
    }

    /// Whether `digest` looks like a digest of this algorithm
    #[must_use]
    pub fn is_valid_digest(self, digest: &str) -> bool {
        digest.len() == self.hex_len()
            && digest.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Sha512 => write!(f, "sha512"),
        }
    }
}

impl std::str::FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(format!("Invalid digest algorithm: {s}. Use: sha256, sha512")),
        }
    }
}

/// One file of a unit
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Normalized relative path
    pub path: String,
    /// Lowercase hex content digest
    pub digest: String,
}

/// Persisted manifest of a configuration unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitManifest {
    /// Unit identifier
    pub unit: String,
    /// Algorithm used for every digest in this manifest
    pub algorithm: DigestAlgorithm,
    /// When the manifest was computed
    pub generated_at: DateTime<Utc>,
    /// Digest over the sorted `path:digest` list
    pub unit_digest: String,
    /// Entries sorted by path
    pub files: Vec<ManifestEntry>,
}

/// A configuration unit: a named set of files whose manifest gates stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUnit {
    /// Unit identifier
    pub id: String,

    /// Globs selecting the unit's files
    pub files: Vec<String>,

    /// Generated context artifact describing the unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Top-level sections the artifact may contain at most once each
    #[serde(default = "default_sections")]
    pub sections: Vec<String>,
}

fn default_sections() -> Vec<String> {
    ["Why", "Where", "What", "How"].iter().map(|s| (*s).to_string()).collect()
}

impl ConfigUnit {
    /// Unit with default sections and no artifact
    #[must_use]
    pub fn new(id: &str, files: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            files: files.iter().map(|f| (*f).to_string()).collect(),
            context: None,
            sections: default_sections(),
        }
    }

    /// Attach a context artifact path
    #[must_use]
    pub fn with_context(mut self, path: &str) -> Self {
        self.context = Some(path.to_string());
        self
    }
}

/// Aggregate digest of a set of entries
///
/// Entries are sorted by path and deduplicated first, so the result does not
/// depend on input order.
#[must_use]
pub fn unit_digest(algorithm: DigestAlgorithm, entries: &[ManifestEntry]) -> String {
    let mut sorted: Vec<&ManifestEntry> = entries.iter().collect();
    sorted.sort();
    sorted.dedup();

    let mut buf = String::new();
    for entry in sorted {
        buf.push_str(&entry.path);
        buf.push(':');
        buf.push_str(&entry.digest);
        buf.push('\n');
    }
    algorithm.hex_digest(buf.as_bytes())
}

/// A reason a unit (or its dependent artifact) can no longer be trusted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriftReason {
    /// No stored manifest exists
    Missing,
    /// The stored manifest is structurally invalid
    Malformed {
        /// What is wrong with it
        detail: String,
    },
    /// Stored and expected algorithms differ
    AlgorithmMismatch {
        /// Algorithm in the stored manifest
        stored: DigestAlgorithm,
        /// Algorithm the project is configured for
        expected: DigestAlgorithm,
    },
    /// A live file could not be read
    Unreadable {
        /// Path of the file
        path: String,
        /// Read error
        error: String,
    },
    /// Files present now but not in the manifest
    FilesAdded {
        /// Added paths
        paths: Vec<String>,
    },
    /// Files in the manifest that are gone
    FilesRemoved {
        /// Removed paths
        paths: Vec<String>,
    },
    /// Files whose content digest changed
    ContentChanged {
        /// Changed paths
        paths: Vec<String>,
    },
    /// A required section appears more than once in the context artifact
    DuplicateSection {
        /// Section title
        section: String,
        /// Number of occurrences
        count: usize,
    },
    /// More than one manifest stamp in the context artifact
    DuplicateManifest {
        /// Number of stamps
        count: usize,
    },
    /// The context artifact was stamped from a different unit digest
    StaleArtifact {
        /// Digest recorded in the artifact
        recorded: String,
        /// Live unit digest
        live: String,
    },
}

impl std::fmt::Display for DriftReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "no manifest"),
            Self::Malformed { detail } => write!(f, "malformed manifest: {detail}"),
            Self::AlgorithmMismatch { stored, expected } => {
                write!(f, "algorithm mismatch: stored {stored}, expected {expected}")
            },
            Self::Unreadable { path, error } => write!(f, "cannot read {path}: {error}"),
            Self::FilesAdded { paths } => write!(f, "files added: {}", paths.join(", ")),
            Self::FilesRemoved { paths } => write!(f, "files removed: {}", paths.join(", ")),
            Self::ContentChanged { paths } => write!(f, "content changed: {}", paths.join(", ")),
            Self::DuplicateSection { section, count } => {
                write!(f, "section '{section}' appears {count} times")
            },
            Self::DuplicateManifest { count } => write!(f, "{count} manifest stamps in artifact"),
            Self::StaleArtifact { recorded, live } => {
                write!(f, "artifact stamped {recorded}, live digest is {live}")
            },
        }
    }
}

/// Result of comparing a stored manifest against the live file set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DriftStatus {
    /// Stored manifest matches the live files
    Ok,
    /// Stored manifest cannot be trusted
    Drift {
        /// Why
        reasons: Vec<DriftReason>,
    },
}

impl DriftStatus {
    /// Drift with a single reason
    #[must_use]
    pub fn drift(reason: DriftReason) -> Self {
        Self::Drift {
            reasons: vec![reason],
        }
    }

    /// Whether the manifest is still valid
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Reasons for drift (empty when ok)
    #[must_use]
    pub fn reasons(&self) -> &[DriftReason] {
        match self {
            Self::Ok => &[],
            Self::Drift { reasons } => reasons,
        }
    }
}
