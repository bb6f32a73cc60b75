//! Execution model
//!
//! Outcomes of running stages: the raw process result, the per-stage status
//! machine, and the report of a whole run.

use serde::{Deserialize, Serialize};

use super::DriftReason;

/// How an external process ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Termination {
    /// Exited normally with a code
    Exited {
        /// Process exit code
        code: i32,
    },
    /// Killed by a signal
    Signaled {
        /// Signal number, when the platform reports one
        signal: Option<i32>,
    },
    /// Exceeded its wall-clock limit and was killed
    TimedOut {
        /// The limit that was exceeded, in milliseconds
        limit_ms: u64,
    },
}

/// Outcome of running one stage process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Stage that produced this result
    pub stage_id: String,

    /// Exit code (-1 when the process did not exit normally)
    pub exit_code: i32,

    /// How the process ended
    pub termination: Termination,

    /// Captured stdout
    pub stdout: String,

    /// Captured stderr
    pub stderr: String,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Result of a process that exited with `code`
    #[must_use]
    pub fn exited(stage_id: &str, code: i32, stdout: String, stderr: String, duration_ms: u64) -> Self {
        Self {
            stage_id: stage_id.to_string(),
            exit_code: code,
            termination: Termination::Exited { code },
            stdout,
            stderr,
            duration_ms,
        }
    }

    /// Exit code 0 is the only success condition
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.termination, Termination::Exited { code: 0 })
    }

    /// The failure kind, if this result is a failure
    #[must_use]
    pub fn failure(&self) -> Option<FailureKind> {
        match self.termination {
            Termination::Exited { code: 0 } => None,
            Termination::Exited { code } => Some(FailureKind::ExitCode { code }),
            Termination::Signaled { signal } => Some(FailureKind::Signal { signal }),
            Termination::TimedOut { limit_ms } => Some(FailureKind::Timeout { limit_ms }),
        }
    }
}

/// Why a stage failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureKind {
    /// The check ran and reported a problem
    ExitCode {
        /// Non-zero exit code
        code: i32,
    },
    /// The check was terminated by a signal
    Signal {
        /// Signal number, when known
        signal: Option<i32>,
    },
    /// The check hung and was killed
    Timeout {
        /// The limit that was exceeded, in milliseconds
        limit_ms: u64,
    },
    /// The process could not be started
    SpawnFailed {
        /// Error from the OS
        error: String,
    },
    /// The stage's configuration unit drifted since its manifest was generated
    Drift {
        /// Unit that drifted
        unit: String,
        /// Reasons reported by the drift detector
        reasons: Vec<DriftReason>,
    },
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExitCode { code } => write!(f, "exited with code {code}"),
            Self::Signal { signal: Some(sig) } => write!(f, "terminated by signal {sig}"),
            Self::Signal { signal: None } => write!(f, "terminated abnormally"),
            Self::Timeout { limit_ms } => write!(f, "timed out after {limit_ms}ms"),
            Self::SpawnFailed { error } => write!(f, "failed to start: {error}"),
            Self::Drift { unit, reasons } => {
                write!(f, "configuration unit '{unit}' drifted")?;
                if let Some(first) = reasons.first() {
                    write!(f, " ({first})")?;
                }
                Ok(())
            },
        }
    }
}

/// Per-stage state machine: `Pending -> Running -> {Succeeded | Failed | Skipped}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StageStatus {
    /// Not started (and never started, if an earlier stage failed)
    Pending,
    /// Process in flight
    Running,
    /// Exit code 0 (and the secondary suite, if it ran)
    Succeeded,
    /// Any failure
    Failed {
        /// What went wrong
        failure: FailureKind,
    },
    /// An explicit precondition was unmet
    Skipped {
        /// The unmet precondition
        reason: String,
    },
}

impl StageStatus {
    /// Whether the stage reached a terminal state
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Running)
    }

    /// Whether the stage failed
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Short label used in reports
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "passed",
            Self::Failed { .. } => "FAILED",
            Self::Skipped { .. } => "skipped",
        }
    }
}

/// What happened to one stage during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    /// Stage id
    pub stage_id: String,

    /// Final status
    pub status: StageStatus,

    /// Process results, primary first, then the secondary suite if it ran
    pub results: Vec<ExecutionResult>,

    /// Files the stage was narrowed to, when changed-only narrowing applied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub narrowed_to: Option<Vec<String>>,
}

impl StageReport {
    /// A stage that has not run
    #[must_use]
    pub fn pending(stage_id: &str) -> Self {
        Self {
            stage_id: stage_id.to_string(),
            status: StageStatus::Pending,
            results: Vec::new(),
            narrowed_to: None,
        }
    }

    /// The failing process result, if the stage failed on one
    #[must_use]
    pub fn failing_result(&self) -> Option<&ExecutionResult> {
        self.results.iter().find(|r| !r.passed())
    }
}

/// Outcome of a whole pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Whether every executed stage succeeded
    pub success: bool,

    /// One entry per selected stage, in execution order
    pub stages: Vec<StageReport>,

    /// Total duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineReport {
    /// All process results in the order they were produced
    #[must_use]
    pub fn results(&self) -> Vec<&ExecutionResult> {
        self.stages.iter().flat_map(|s| s.results.iter()).collect()
    }

    /// First failed stage
    #[must_use]
    pub fn first_failure(&self) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.status.is_failed())
    }

    /// Number of stages that succeeded
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.stages.iter().filter(|s| s.status == StageStatus::Succeeded).count()
    }

    /// Number of stages that failed
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.stages.iter().filter(|s| s.status.is_failed()).count()
    }
}
