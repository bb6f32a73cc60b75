//! Git integration adapter
//!
//! Implements the `DiffProvider` port with `git2`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use git2::{DiffOptions, Repository};

use crate::core::models::normalize_path;
use crate::core::ports::DiffProvider;

/// Changed paths relative to a baseline ref, read through libgit2
#[derive(Debug, Clone)]
pub struct GitDiffProvider {
    /// Project root (may be below the repository work tree)
    root: PathBuf,
    /// Revision the working tree is compared against
    baseline_ref: String,
}

impl GitDiffProvider {
    /// Create a provider for `root` diffing against `baseline_ref`
    #[must_use]
    pub fn new(root: PathBuf, baseline_ref: &str) -> Self {
        Self {
            root,
            baseline_ref: baseline_ref.to_string(),
        }
    }
}

impl DiffProvider for GitDiffProvider {
    fn changed_paths(&self) -> anyhow::Result<Vec<String>> {
        let repo = Repository::discover(&self.root)
            .with_context(|| format!("not a git repository: {}", self.root.display()))?;
        let workdir = repo.workdir().context("bare repository has no working tree")?;

        let tree = repo
            .revparse_single(&self.baseline_ref)
            .and_then(|obj| obj.peel_to_tree())
            .with_context(|| format!("cannot resolve baseline {}", self.baseline_ref))?;

        let mut opts = DiffOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        let diff = repo.diff_tree_to_workdir_with_index(Some(&tree), Some(&mut opts))?;

        let prefix = project_prefix(workdir, &self.root);
        let mut paths = BTreeSet::new();
        for delta in diff.deltas() {
            for file in [delta.old_file(), delta.new_file()] {
                let Some(path) = file.path() else { continue };
                let path = normalize_path(path);
                if let Some(relative) = strip_prefix(&path, &prefix) {
                    paths.insert(relative.to_string());
                }
            }
        }

        log::debug!("{} path(s) changed since {}", paths.len(), self.baseline_ref);
        Ok(paths.into_iter().collect())
    }
}

/// Discover the work-tree root of the repository containing `start`
#[must_use]
pub fn discover_root(start: &Path) -> Option<PathBuf> {
    let repo = Repository::discover(start).ok()?;
    repo.workdir().map(Path::to_path_buf)
}

/// The project root relative to the work tree, `/`-separated (empty at the top)
fn project_prefix(workdir: &Path, root: &Path) -> String {
    let workdir = workdir.canonicalize().unwrap_or_else(|_| workdir.to_path_buf());
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    root.strip_prefix(&workdir).map(normalize_path).unwrap_or_default()
}

fn strip_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    path.strip_prefix(prefix)?.strip_prefix('/')
}
