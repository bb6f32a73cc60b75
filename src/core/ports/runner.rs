//! Stage runner port
//!
//! Runs one external process to completion (or until its time limit).

use std::path::PathBuf;
use std::time::Duration;

use crate::core::models::ExecutionResult;

/// Everything needed to start one stage process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Stage id the result is reported under
    pub stage_id: String,
    /// Executable
    pub command: String,
    /// Ordered arguments
    pub args: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
    /// Wall-clock limit
    pub timeout: Duration,
}

/// Executes stage processes
#[cfg_attr(test, mockall::automock)]
pub trait StageRunner {
    /// Run the invocation and wait for it
    ///
    /// A process that starts but fails, crashes, or times out is an `Ok`
    /// result describing that. `Err` means it could not be started at all.
    fn execute(&self, invocation: &Invocation) -> anyhow::Result<ExecutionResult>;
}
