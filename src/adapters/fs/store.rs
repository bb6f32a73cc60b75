//! File-backed stores
//!
//! Every write replaces the whole file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::core::models::UnitManifest;
use crate::core::ports::{BaselineStore, ContextArtifacts, ManifestStore};
use crate::core::services::FileFix;

/// Manifests stored as pretty JSON, one file per unit
#[derive(Debug, Clone)]
pub struct FsManifestStore {
    dir: PathBuf,
}

impl FsManifestStore {
    /// Store manifests under `dir`
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// File a unit's manifest is stored in
    #[must_use]
    pub fn path_for(&self, unit: &str) -> PathBuf {
        self.dir.join(format!("{}.json", unit_to_filename(unit)))
    }
}

impl ManifestStore for FsManifestStore {
    fn load(&self, unit: &str) -> anyhow::Result<Option<String>> {
        read_optional(&self.path_for(unit))
    }

    fn save(&self, manifest: &UnitManifest) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(manifest)?;
        write_replacing(&self.path_for(&manifest.unit), &(json + "\n"))
    }

    fn expire(&self, unit: &str) -> anyhow::Result<()> {
        remove_optional(&self.path_for(unit))
    }
}

/// The last-verified marker as a single RFC 3339 line
#[derive(Debug, Clone)]
pub struct FsBaselineStore {
    path: PathBuf,
}

impl FsBaselineStore {
    /// Store the marker at `path`
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl BaselineStore for FsBaselineStore {
    fn load(&self) -> anyhow::Result<Option<String>> {
        read_optional(&self.path)
    }

    fn save(&self, at: DateTime<Utc>) -> anyhow::Result<()> {
        let line = at.to_rfc3339_opts(SecondsFormat::Secs, true);
        write_replacing(&self.path, &format!("{line}\n"))
    }
}

/// Context artifacts addressed relative to the project root
#[derive(Debug, Clone)]
pub struct FsContextArtifacts {
    root: PathBuf,
}

impl FsContextArtifacts {
    /// Resolve artifacts against `root`
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ContextArtifacts for FsContextArtifacts {
    fn read(&self, path: &str) -> anyhow::Result<Option<String>> {
        read_optional(&self.root.join(path))
    }

    fn write(&self, path: &str, text: &str) -> anyhow::Result<()> {
        write_replacing(&self.root.join(path), text)
    }

    fn remove(&self, path: &str) -> anyhow::Result<()> {
        remove_optional(&self.root.join(path))
    }
}

/// Write planned fixes into the project tree
///
/// Returns the number of files rewritten.
pub fn apply_fixes(root: &Path, fixes: &[FileFix]) -> anyhow::Result<usize> {
    for fix in fixes {
        write_replacing(&root.join(&fix.path), &fix.updated)?;
        log::info!("fixed {} ({} replacement(s))", fix.path, fix.replacements);
    }
    Ok(fixes.len())
}

/// Convert a unit id to a flat filename
/// e.g., "config/eslint" -> "config%2Feslint"
///
/// Bytes outside `[A-Za-z0-9._-]` are percent-escaped, so distinct ids never
/// share a file.
fn unit_to_filename(unit: &str) -> String {
    let mut name = String::with_capacity(unit.len());
    for b in unit.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-') {
            name.push(char::from(b));
        } else {
            name.push_str(&format!("%{b:02X}"));
        }
    }
    name
}

fn read_optional(path: &Path) -> anyhow::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
    }
}

fn write_replacing(path: &Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

fn remove_optional(path: &Path) -> anyhow::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", path.display())),
    }
}
