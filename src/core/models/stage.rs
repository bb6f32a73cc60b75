//! Stage model
//!
//! A stage is one named, ordered step of the pipeline: an opaque external
//! command whose exit code is the whole contract.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What kind of check a stage performs
///
/// The executor only treats `Lint` and `Test` specially: lint stages may be
/// narrowed to changed files, test stages may trigger the secondary suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Policy scan (banned terms, forbidden constructs)
    Policy,
    /// Type-check invocation
    Typecheck,
    /// Linter invocation
    Lint,
    /// Build invocation
    Build,
    /// Test suite invocation
    Test,
    /// Anything else
    #[default]
    Other,
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Policy => write!(f, "policy"),
            Self::Typecheck => write!(f, "typecheck"),
            Self::Lint => write!(f, "lint"),
            Self::Build => write!(f, "build"),
            Self::Test => write!(f, "test"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Whether a stage belongs to the enforced gate, the diagnostics pass, or both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageMode {
    /// Enforced gate only
    GateOnly,
    /// Non-blocking diagnostics only
    DiagnosticsOnly,
    /// Both
    #[default]
    Both,
}

/// Which invocation context includes a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageScope {
    /// CI runs
    Ci,
    /// Local preflight runs
    Preflight,
    /// CI and preflight
    #[default]
    Both,
    /// Only the diagnostics pass
    DiagnosticsOnly,
}

/// The invocation context of a whole pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunScope {
    /// Enforced gate, CI flavour
    Ci,
    /// Enforced gate, local flavour
    #[default]
    Preflight,
    /// Non-blocking diagnostics pass
    Diagnostics,
}

impl RunScope {
    /// Whether a failing stage ends the run
    #[must_use]
    pub const fn is_gate(self) -> bool {
        !matches!(self, Self::Diagnostics)
    }
}

impl std::fmt::Display for RunScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ci => write!(f, "ci"),
            Self::Preflight => write!(f, "preflight"),
            Self::Diagnostics => write!(f, "diagnostics"),
        }
    }
}

/// Immutable descriptor of one pipeline step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Unique, stable identifier (e.g. `policy:anti_mvp`)
    pub id: String,

    /// Executable to invoke
    pub command: String,

    /// Ordered arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Kind of check
    #[serde(default)]
    pub kind: StageKind,

    /// Gate / diagnostics participation
    #[serde(default)]
    pub mode: StageMode,

    /// Invocation contexts that include this stage
    #[serde(default)]
    pub scope: StageScope,

    /// Configuration unit this stage's correctness depends on (may be empty)
    #[serde(default, rename = "unit")]
    pub config_unit: String,

    /// Globs of files eligible for changed-only narrowing
    #[serde(default)]
    pub files: Vec<String>,

    /// Arguments appended when the stage runs over the full tree
    #[serde(default)]
    pub targets: Vec<String>,

    /// Globs that must match at least one file, otherwise the stage is skipped
    #[serde(default)]
    pub requires: Vec<String>,

    /// Per-stage wall-clock limit
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl StageDefinition {
    /// Create a stage with defaults for everything but id and invocation
    #[must_use]
    pub fn new(id: &str, command: &str, args: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            command: command.to_string(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            kind: StageKind::Other,
            mode: StageMode::Both,
            scope: StageScope::Both,
            config_unit: String::new(),
            files: Vec::new(),
            targets: Vec::new(),
            requires: Vec::new(),
            timeout_secs: None,
        }
    }

    /// Set the stage kind
    #[must_use]
    pub fn with_kind(mut self, kind: StageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set mode and scope
    #[must_use]
    pub fn with_participation(mut self, mode: StageMode, scope: StageScope) -> Self {
        self.mode = mode;
        self.scope = scope;
        self
    }

    /// Bind the stage to a configuration unit
    #[must_use]
    pub fn with_unit(mut self, unit: &str) -> Self {
        self.config_unit = unit.to_string();
        self
    }

    /// Set the narrowing globs and full-tree targets
    #[must_use]
    pub fn with_files(mut self, files: &[&str], targets: &[&str]) -> Self {
        self.files = files.iter().map(|f| (*f).to_string()).collect();
        self.targets = targets.iter().map(|t| (*t).to_string()).collect();
        self
    }

    /// Set the precondition globs
    #[must_use]
    pub fn with_requires(mut self, requires: &[&str]) -> Self {
        self.requires = requires.iter().map(|r| (*r).to_string()).collect();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Whether this stage takes part in a run of the given scope
    #[must_use]
    pub const fn included_in(&self, run: RunScope) -> bool {
        match run {
            RunScope::Ci => {
                !matches!(self.mode, StageMode::DiagnosticsOnly)
                    && matches!(self.scope, StageScope::Ci | StageScope::Both)
            },
            RunScope::Preflight => {
                !matches!(self.mode, StageMode::DiagnosticsOnly)
                    && matches!(self.scope, StageScope::Preflight | StageScope::Both)
            },
            RunScope::Diagnostics => !matches!(self.mode, StageMode::GateOnly),
        }
    }

    /// Effective timeout, falling back to the project default
    #[must_use]
    pub fn timeout(&self, default: Duration) -> Duration {
        self.timeout_secs.map_or(default, Duration::from_secs)
    }

    /// Whether the stage depends on a configuration unit
    #[must_use]
    pub fn has_unit(&self) -> bool {
        !self.config_unit.trim().is_empty()
    }
}

/// The optional secondary test suite a test stage may trigger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecondarySuite {
    /// Home directory of the suite; no directory means nothing to run
    pub dir: String,

    /// Path prefixes whose changes make the suite relevant
    #[serde(default)]
    pub tracked: Vec<String>,

    /// Executable
    pub command: String,

    /// Ordered arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Wall-clock limit
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl SecondarySuite {
    /// Stage id the suite's result is reported under
    #[must_use]
    pub fn stage_id(&self, parent: &str) -> String {
        format!("{parent}:secondary")
    }

    /// Tracked subtrees; the suite directory itself when none are configured
    #[must_use]
    pub fn tracked_prefixes(&self) -> Vec<String> {
        if self.tracked.is_empty() {
            vec![self.dir.clone()]
        } else {
            self.tracked.clone()
        }
    }

    /// Whether a changed path falls under one of the tracked subtrees
    #[must_use]
    pub fn tracks(&self, path: &str) -> bool {
        let path = path.trim_start_matches("./");
        self.tracked_prefixes().iter().any(|prefix| {
            let prefix = prefix.trim_start_matches("./").trim_end_matches('/');
            !prefix.is_empty()
                && (path == prefix
                    || path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/')))
        })
    }
}
