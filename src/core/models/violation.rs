//! Violation model
//!
//! One reported defect from a scan. Violations live for one run: they are
//! created during a scan pass and rendered into the failure report.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A defect found by a check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule that reported it
    pub rule_id: String,

    /// File it was found in (relative to the scan root)
    pub file: PathBuf,

    /// 1-indexed line
    pub line: usize,

    /// Human-readable message
    pub message: String,

    /// The matched text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Violation {
    /// Create a violation without a snippet
    #[must_use]
    pub fn new(rule_id: &str, file: impl Into<PathBuf>, line: usize, message: &str) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            file: file.into(),
            line: line.max(1),
            message: message.to_string(),
            snippet: None,
        }
    }

    /// Attach the matched text
    #[must_use]
    pub fn with_snippet(mut self, snippet: &str) -> Self {
        self.snippet = Some(snippet.to_string());
        self
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} [{}] {}", self.file.display(), self.line, self.rule_id, self.message)?;
        if let Some(snippet) = &self.snippet {
            write!(f, " ({snippet})")?;
        }
        Ok(())
    }
}

/// Sort violations by file, then line; equal keys keep their relative order
pub fn sort_violations(violations: &mut [Violation]) {
    violations.sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
}
