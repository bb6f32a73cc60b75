//! Project tree access

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use walkdir::{DirEntry, WalkDir};

use crate::core::models::{PathGlob, normalize_path};
use crate::core::ports::{ContentReader, Workspace};

/// Directories never descended into
const SKIPPED_DIRS: &[&str] = &[".git", ".qualities", "node_modules", "target"];

/// The project tree rooted at a directory
#[derive(Debug, Clone)]
pub struct FsWorkspace {
    root: PathBuf,
}

impl FsWorkspace {
    /// Workspace rooted at `root`
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Walk `start`, pruning skipped directories
    fn walk_files(&self, start: &Path) -> impl Iterator<Item = walkdir::Result<DirEntry>> {
        let start = start.to_path_buf();
        WalkDir::new(&start)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |e| e.path() == start || !is_skipped_dir(e))
    }

    fn relative(&self, path: &Path) -> String {
        normalize_path(path.strip_prefix(&self.root).unwrap_or(path))
    }
}

impl Workspace for FsWorkspace {
    fn root(&self) -> PathBuf {
        self.root.clone()
    }

    fn dir_exists(&self, relative: &str) -> bool {
        !relative.trim().is_empty() && self.root.join(relative).is_dir()
    }

    fn file_exists(&self, relative: &str) -> bool {
        self.root.join(relative).is_file()
    }

    fn any_matches(&self, globs: &[String]) -> bool {
        let Ok(globs) = PathGlob::compile_all(globs) else {
            return false;
        };
        self.walk_files(&self.root)
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .any(|e| PathGlob::any_match(&globs, &self.relative(e.path())))
    }

    fn list_matching(&self, globs: &[String]) -> anyhow::Result<Vec<String>> {
        let globs = PathGlob::compile_all(globs)?;
        let mut files = Vec::new();
        for entry in self.walk_files(&self.root) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = self.relative(entry.path());
            if PathGlob::any_match(&globs, &relative) {
                files.push(relative);
            }
        }
        files.sort();
        Ok(files)
    }

    fn any_modified_after(&self, prefixes: &[String], since: DateTime<Utc>) -> Option<bool> {
        for prefix in prefixes {
            let start = self.root.join(prefix.trim_start_matches("./"));
            if !start.exists() {
                continue;
            }
            for entry in self.walk_files(&start) {
                let entry = entry.ok()?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let modified: DateTime<Utc> = entry.metadata().ok()?.modified().ok()?.into();
                if modified > since {
                    log::debug!("{} modified after baseline", self.relative(entry.path()));
                    return Some(true);
                }
            }
        }
        Some(false)
    }
}

/// Reads files relative to the project root
#[derive(Debug, Clone)]
pub struct FsContentReader {
    root: PathBuf,
}

impl FsContentReader {
    /// Reader rooted at `root`
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ContentReader for FsContentReader {
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        fs::read(self.root.join(path))
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIPPED_DIRS.contains(&name))
}
