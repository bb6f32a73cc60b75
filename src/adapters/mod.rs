//! Adapter implementations for port traits
//!
//! This module contains concrete implementations that handle I/O:
//!
//! - `git/` - Changed paths via libgit2
//! - `process/` - Stage processes with captured output and time limits
//! - `fs/` - Project tree, manifests, baseline marker, context artifacts

pub mod fs;
pub mod git;
pub mod process;

pub use fs::{
    FsBaselineStore, FsContentReader, FsContextArtifacts, FsManifestStore, FsWorkspace, apply_fixes,
};
pub use git::{GitDiffProvider, discover_root};
pub use process::ProcessRunner;
