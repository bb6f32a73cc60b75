//! Content ports
//!
//! File bytes for digesting, persistence of unit manifests, and the
//! context artifacts derived from units.

use std::path::Path;

use crate::core::models::UnitManifest;

/// Supplies file content by relative path
#[cfg_attr(test, mockall::automock)]
pub trait ContentReader {
    /// Raw bytes of the file
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// Persists manifests, one per unit
///
/// Saving replaces the whole manifest; there is no incremental update.
#[cfg_attr(test, mockall::automock)]
pub trait ManifestStore {
    /// Raw stored manifest text, `None` when absent
    fn load(&self, unit: &str) -> anyhow::Result<Option<String>>;

    /// Write (replace) the manifest
    fn save(&self, manifest: &UnitManifest) -> anyhow::Result<()>;

    /// Delete the manifest; deleting an absent manifest is not an error
    fn expire(&self, unit: &str) -> anyhow::Result<()>;
}

/// Generated context artifacts, addressed by project-relative path
#[cfg_attr(test, mockall::automock)]
pub trait ContextArtifacts {
    /// Artifact text, `None` when absent
    fn read(&self, path: &str) -> anyhow::Result<Option<String>>;

    /// Replace the artifact text
    fn write(&self, path: &str, text: &str) -> anyhow::Result<()>;

    /// Delete the artifact; deleting an absent artifact is not an error
    fn remove(&self, path: &str) -> anyhow::Result<()>;
}
