//! Filesystem adapters
//!
//! Implements the content, manifest, artifact, baseline and workspace ports
//! against the project directory.
//!
//! - [`FsWorkspace`] / [`FsContentReader`] - the project tree
//! - [`FsManifestStore`] - `.qualities/manifests/<unit>.json`
//! - [`FsBaselineStore`] - `.qualities/last-verified`
//! - [`FsContextArtifacts`] - context artifacts inside the project
//! - [`apply_fixes`] - writes planned scanner fixes

mod store;
mod workspace;

pub use store::{FsBaselineStore, FsContextArtifacts, FsManifestStore, apply_fixes};
pub use workspace::{FsContentReader, FsWorkspace};
