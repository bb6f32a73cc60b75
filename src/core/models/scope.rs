//! Scope decision model
//!
//! Inputs and outputs of the selective scope resolver. Inputs are plain data
//! gathered up front so that the decision itself is a pure function.

use serde::{Deserialize, Serialize};

/// Evidence the secondary-suite decision is made from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDecisionInputs {
    /// Whether the secondary suite's home directory exists
    pub suite_dir_exists: bool,

    /// Changed paths from the diff provider; `None` when the diff was unavailable
    pub changed_paths: Option<Vec<String>>,

    /// The persisted "last verified" marker, as stored (may be empty)
    pub last_verified_at: Option<String>,

    /// Whether any tracked file is newer than the marker; `None` when unknown
    pub any_file_newer_than_last_verified: Option<bool>,
}

/// Which precedence step produced a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Suite directory missing
    NoSuiteDir,
    /// Diff touched a tracked subtree
    DiffTouchesTrackedPaths,
    /// No usable baseline timestamp
    NoBaseline,
    /// Baseline present but freshness could not be determined
    FreshnessUnknown,
    /// Tracked files were modified after the baseline
    NewerFiles,
    /// Nothing modified after the baseline
    UpToDate,
}

impl std::fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSuiteDir => write!(f, "secondary suite directory does not exist"),
            Self::DiffTouchesTrackedPaths => write!(f, "diff touches tracked paths"),
            Self::NoBaseline => write!(f, "no last-verified baseline"),
            Self::FreshnessUnknown => write!(f, "cannot tell whether files changed since baseline"),
            Self::NewerFiles => write!(f, "files modified since last verification"),
            Self::UpToDate => write!(f, "nothing modified since last verification"),
        }
    }
}

/// Whether to run the secondary suite, and why
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDecision {
    /// The decision
    pub run_secondary_suite: bool,
    /// The precedence step that decided
    pub reason: DecisionReason,
}

/// Whether a lint-like check looks at changed files or the whole tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileScope {
    /// Whole tree
    #[default]
    Full,
    /// Only files changed since the diff baseline
    ChangedOnly,
}

/// Input set chosen for a lint-like check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "selection", content = "files", rename_all = "snake_case")]
pub enum FileSelection {
    /// Run over these files only
    Changed(Vec<String>),
    /// Run over the whole tree
    FullTree,
}

impl FileSelection {
    /// Files to check, `None` for the full tree
    #[must_use]
    pub fn files(&self) -> Option<&[String]> {
        match self {
            Self::Changed(files) => Some(files),
            Self::FullTree => None,
        }
    }
}
