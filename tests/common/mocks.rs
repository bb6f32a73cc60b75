//! In-memory implementations of port traits for testing
//!
//! These mocks provide configurable behavior for exercising the services
//! without real I/O operations.

use chrono::{DateTime, Utc};
use qualities::core::models::{DriftStatus, ExecutionResult, PathGlob, UnitManifest};
use qualities::core::ports::{
    BaselineStore, ContentReader, ContextArtifacts, DiffProvider, DriftGate, Invocation,
    ManifestStore, StageRunner, Workspace,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// A project tree held in memory; doubles as the content reader
pub struct MemWorkspace {
    files: RefCell<BTreeMap<String, Vec<u8>>>,
    dirs: HashSet<String>,
    unreadable: HashSet<String>,
    newer: Option<bool>,
}

impl MemWorkspace {
    pub fn new() -> Self {
        Self {
            files: RefCell::new(BTreeMap::new()),
            dirs: HashSet::new(),
            unreadable: HashSet::new(),
            newer: Some(false),
        }
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.files.borrow_mut().insert(path.to_string(), content.as_bytes().to_vec());
        self
    }

    pub fn with_dir(mut self, dir: &str) -> Self {
        self.dirs.insert(dir.to_string());
        self
    }

    /// The file is listed but reading it fails
    pub fn with_unreadable(mut self, path: &str) -> Self {
        self.files.borrow_mut().insert(path.to_string(), Vec::new());
        self.unreadable.insert(path.to_string());
        self
    }

    /// What `any_modified_after` answers
    pub fn with_newer(mut self, newer: Option<bool>) -> Self {
        self.newer = newer;
        self
    }

    pub fn set_file(&self, path: &str, content: &str) {
        self.files.borrow_mut().insert(path.to_string(), content.as_bytes().to_vec());
    }

    pub fn remove_file(&self, path: &str) {
        self.files.borrow_mut().remove(path);
    }
}

impl Default for MemWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentReader for MemWorkspace {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let key = path.to_string_lossy().to_string();
        if self.unreadable.contains(&key) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        self.files
            .borrow()
            .get(&key)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }
}

impl Workspace for MemWorkspace {
    fn root(&self) -> PathBuf {
        PathBuf::from("/project")
    }

    fn dir_exists(&self, relative: &str) -> bool {
        self.dirs.contains(relative)
    }

    fn file_exists(&self, relative: &str) -> bool {
        self.files.borrow().contains_key(relative)
    }

    fn any_matches(&self, globs: &[String]) -> bool {
        self.list_matching(globs).map(|files| !files.is_empty()).unwrap_or(false)
    }

    fn list_matching(&self, globs: &[String]) -> anyhow::Result<Vec<String>> {
        let globs = PathGlob::compile_all(globs)?;
        Ok(self
            .files
            .borrow()
            .keys()
            .filter(|path| PathGlob::any_match(&globs, path))
            .cloned()
            .collect())
    }

    fn any_modified_after(&self, _prefixes: &[String], _since: DateTime<Utc>) -> Option<bool> {
        self.newer
    }
}

/// Runner that records invocations and answers with scripted exit codes
pub struct ScriptedRunner {
    exit_codes: HashMap<String, i32>,
    unstartable: HashSet<String>,
    calls: RefCell<Vec<Invocation>>,
}

impl ScriptedRunner {
    /// Every stage exits 0 unless scripted otherwise
    pub fn new() -> Self {
        Self {
            exit_codes: HashMap::new(),
            unstartable: HashSet::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn exits(mut self, stage_id: &str, code: i32) -> Self {
        self.exit_codes.insert(stage_id.to_string(), code);
        self
    }

    pub fn cannot_start(mut self, stage_id: &str) -> Self {
        self.unstartable.insert(stage_id.to_string());
        self
    }

    /// Stage ids in invocation order
    pub fn invoked(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|c| c.stage_id.clone()).collect()
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }
}

impl Default for ScriptedRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl StageRunner for ScriptedRunner {
    fn execute(&self, invocation: &Invocation) -> anyhow::Result<ExecutionResult> {
        self.calls.borrow_mut().push(invocation.clone());
        if self.unstartable.contains(&invocation.stage_id) {
            anyhow::bail!("{}: command not found", invocation.command);
        }
        let code = self.exit_codes.get(&invocation.stage_id).copied().unwrap_or(0);
        let stderr = if code == 0 { String::new() } else { format!("{} failed\n", invocation.stage_id) };
        Ok(ExecutionResult::exited(&invocation.stage_id, code, String::new(), stderr, 1))
    }
}

/// Diff provider with a fixed answer; `None` means unavailable
pub struct FixedDiff(pub Option<Vec<String>>);

impl FixedDiff {
    pub fn changed(paths: &[&str]) -> Self {
        Self(Some(paths.iter().map(|p| (*p).to_string()).collect()))
    }

    pub fn unavailable() -> Self {
        Self(None)
    }
}

impl DiffProvider for FixedDiff {
    fn changed_paths(&self) -> anyhow::Result<Vec<String>> {
        self.0.clone().ok_or_else(|| anyhow::anyhow!("not a git repository"))
    }
}

/// Last-verified marker in memory
pub struct MemBaseline {
    value: RefCell<Option<String>>,
}

impl MemBaseline {
    pub fn new(value: Option<&str>) -> Self {
        Self {
            value: RefCell::new(value.map(str::to_string)),
        }
    }

    pub fn value(&self) -> Option<String> {
        self.value.borrow().clone()
    }
}

impl BaselineStore for MemBaseline {
    fn load(&self) -> anyhow::Result<Option<String>> {
        Ok(self.value.borrow().clone())
    }

    fn save(&self, at: DateTime<Utc>) -> anyhow::Result<()> {
        *self.value.borrow_mut() = Some(at.to_rfc3339());
        Ok(())
    }
}

/// Manifests in memory, keyed by unit
pub struct MemManifestStore {
    raw: RefCell<HashMap<String, String>>,
}

impl MemManifestStore {
    pub fn new() -> Self {
        Self {
            raw: RefCell::new(HashMap::new()),
        }
    }

    pub fn put_raw(&self, unit: &str, raw: &str) {
        self.raw.borrow_mut().insert(unit.to_string(), raw.to_string());
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.raw.borrow().contains_key(unit)
    }
}

impl Default for MemManifestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestStore for MemManifestStore {
    fn load(&self, unit: &str) -> anyhow::Result<Option<String>> {
        Ok(self.raw.borrow().get(unit).cloned())
    }

    fn save(&self, manifest: &UnitManifest) -> anyhow::Result<()> {
        let json = serde_json::to_string(manifest)?;
        self.raw.borrow_mut().insert(manifest.unit.clone(), json);
        Ok(())
    }

    fn expire(&self, unit: &str) -> anyhow::Result<()> {
        self.raw.borrow_mut().remove(unit);
        Ok(())
    }
}

/// Context artifacts in memory, keyed by path
pub struct MemArtifacts {
    texts: RefCell<HashMap<String, String>>,
}

impl MemArtifacts {
    pub fn new() -> Self {
        Self {
            texts: RefCell::new(HashMap::new()),
        }
    }

    pub fn with(self, path: &str, text: &str) -> Self {
        self.texts.borrow_mut().insert(path.to_string(), text.to_string());
        self
    }

    pub fn get(&self, path: &str) -> Option<String> {
        self.texts.borrow().get(path).cloned()
    }
}

impl Default for MemArtifacts {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextArtifacts for MemArtifacts {
    fn read(&self, path: &str) -> anyhow::Result<Option<String>> {
        Ok(self.get(path))
    }

    fn write(&self, path: &str, text: &str) -> anyhow::Result<()> {
        self.texts.borrow_mut().insert(path.to_string(), text.to_string());
        Ok(())
    }

    fn remove(&self, path: &str) -> anyhow::Result<()> {
        self.texts.borrow_mut().remove(path);
        Ok(())
    }
}

/// Drift gate with a fixed answer per unit; unknown units are fresh
pub struct StaticDrift {
    drifted: HashMap<String, DriftStatus>,
    asked: RefCell<Vec<String>>,
}

impl StaticDrift {
    pub fn fresh() -> Self {
        Self {
            drifted: HashMap::new(),
            asked: RefCell::new(Vec::new()),
        }
    }

    pub fn with(mut self, unit: &str, status: DriftStatus) -> Self {
        self.drifted.insert(unit.to_string(), status);
        self
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }
}

impl DriftGate for StaticDrift {
    fn verify(&self, unit: &str) -> DriftStatus {
        self.asked.borrow_mut().push(unit.to_string());
        self.drifted.get(unit).cloned().unwrap_or(DriftStatus::Ok)
    }
}
