//! Workspace port
//!
//! Filesystem questions the core needs answered about the project tree.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Read-only view of the project tree
#[cfg_attr(test, mockall::automock)]
pub trait Workspace {
    /// Project root
    fn root(&self) -> PathBuf;

    /// Whether a directory exists, relative to the root
    fn dir_exists(&self, relative: &str) -> bool;

    /// Whether a regular file exists, relative to the root
    fn file_exists(&self, relative: &str) -> bool;

    /// Whether any file matches any of the globs
    fn any_matches(&self, globs: &[String]) -> bool;

    /// All files matching any of the globs, relative and sorted
    fn list_matching(&self, globs: &[String]) -> anyhow::Result<Vec<String>>;

    /// Whether any file under the prefixes was modified after `since`
    ///
    /// `None` when it cannot be determined.
    fn any_modified_after(&self, prefixes: &[String], since: DateTime<Utc>) -> Option<bool>;
}
