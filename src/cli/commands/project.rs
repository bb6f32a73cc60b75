//! The loaded project: root, config and the adapters built over them

use std::path::PathBuf;

use qualities::adapters::{
    FsBaselineStore, FsContentReader, FsContextArtifacts, FsManifestStore, FsWorkspace,
    GitDiffProvider,
};
use qualities::config::QualitiesConfig;
use qualities::core::services::UnitVerifier;
use qualities::paths;

/// Project root plus its validated configuration
pub struct Project {
    pub root: PathBuf,
    pub config: QualitiesConfig,
    pub workspace: FsWorkspace,
    pub reader: FsContentReader,
    pub manifests: FsManifestStore,
    pub artifacts: FsContextArtifacts,
    pub baseline: FsBaselineStore,
    pub diff: GitDiffProvider,
}

impl Project {
    /// Load `.qualities.toml` from the project root
    pub fn load() -> anyhow::Result<Self> {
        let root = paths::project_root();
        let config_path = root.join(paths::QUALITIES_TOML);
        if !config_path.exists() {
            anyhow::bail!("No {} found. Run 'qualities init' first.", paths::QUALITIES_TOML);
        }
        let config = QualitiesConfig::load(&config_path)?;
        log::debug!("project root: {}", root.display());

        Ok(Self {
            workspace: FsWorkspace::new(root.clone()),
            reader: FsContentReader::new(root.clone()),
            manifests: FsManifestStore::new(paths::manifests_dir()),
            artifacts: FsContextArtifacts::new(root.clone()),
            baseline: FsBaselineStore::new(paths::last_verified()),
            diff: GitDiffProvider::new(root.clone(), &config.project.baseline_ref),
            root,
            config,
        })
    }

    /// Unit operations over this project's stores
    pub fn verifier(&self) -> UnitVerifier<'_> {
        UnitVerifier {
            units: &self.config.units,
            workspace: &self.workspace,
            reader: &self.reader,
            store: &self.manifests,
            artifacts: &self.artifacts,
            algorithm: self.config.project.algorithm,
        }
    }
}
