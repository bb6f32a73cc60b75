//! Centralized path definitions for qualities
//!
//! This module provides a single source of truth for all filesystem paths
//! used by qualities.
//!
//! ## Storage Layout
//!
//! ```text
//! repo/
//! ├── .qualities.toml              # SHARED: Committed config
//! └── .qualities/                  # Local state (gitignored)
//!     ├── last-verified           # Scope baseline (RFC 3339 UTC)
//!     └── manifests/
//!         └── <unit>.json         # One manifest per configuration unit
//! ```

use std::path::PathBuf;

use crate::adapters::discover_root;

// =============================================================================
// Project-level paths (per-repository)
// =============================================================================

/// Directory name for local qualities state
pub const QUALITIES_DIR: &str = ".qualities";

/// Project configuration filename
pub const QUALITIES_TOML: &str = ".qualities.toml";

/// Manifests subdirectory
const MANIFESTS_DIR: &str = "manifests";

/// Scope baseline filename
const LAST_VERIFIED_FILE: &str = "last-verified";

/// Get the project root directory.
///
/// The git work-tree root when inside a repository, else the current directory.
#[must_use]
pub fn project_root() -> PathBuf {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    discover_root(&cwd).unwrap_or(cwd)
}

/// Get path to `.qualities.toml` config file.
#[must_use]
pub fn qualities_toml() -> PathBuf {
    project_root().join(QUALITIES_TOML)
}

/// Get path to `.qualities/` state directory.
///
/// This directory is gitignored and contains local state.
#[must_use]
pub fn qualities_dir() -> PathBuf {
    project_root().join(QUALITIES_DIR)
}

/// Get path to `.qualities/manifests/`.
#[must_use]
pub fn manifests_dir() -> PathBuf {
    qualities_dir().join(MANIFESTS_DIR)
}

/// Get path to `.qualities/last-verified`.
///
/// Holds the "last verified" marker consumed by the scope resolver.
#[must_use]
pub fn last_verified() -> PathBuf {
    qualities_dir().join(LAST_VERIFIED_FILE)
}
