//! Project configuration
//!
//! `.qualities.toml` at the project root declares the stages, the optional
//! secondary suite, scan rules and configuration units. It is validated as a
//! whole when loaded; nothing downstream re-checks ids or references.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::models::{
    ConfigUnit, DigestAlgorithm, GlobError, Locale, PathGlob, SecondarySuite, StageDefinition,
};
use crate::core::services::{RuleError, RuleSpec, validate_spec};

/// Errors loading `.qualities.toml`
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File missing or unreadable
    #[error("cannot read {path}: {source}")]
    Read {
        /// Config path
        path: PathBuf,
        /// I/O error
        #[source]
        source: std::io::Error,
    },

    /// Not valid TOML for this schema
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Two stages share an id
    #[error("duplicate stage id: {0}")]
    DuplicateStage(String),

    /// Two units share an id
    #[error("duplicate unit id: {0}")]
    DuplicateUnit(String),

    /// Two unit ids differ only by case and would share a manifest file
    #[error("unit ids '{first}' and '{second}' differ only by case")]
    UnitCaseClash {
        /// Id declared first
        first: String,
        /// Id declared later
        second: String,
    },

    /// Two rules share an id
    #[error("duplicate rule id: {0}")]
    DuplicateRule(String),

    /// Stage bound to an undeclared unit
    #[error("stage '{stage}' references unknown unit '{unit}'")]
    UnknownUnit {
        /// Stage id
        stage: String,
        /// Unit id
        unit: String,
    },

    /// Stage or suite with nothing to run
    #[error("'{0}' has an empty command")]
    EmptyCommand(String),

    /// Glob that does not compile
    #[error("'{owner}': {source}")]
    InvalidGlob {
        /// Stage, unit or section owning the glob
        owner: String,
        /// Glob error
        #[source]
        source: GlobError,
    },

    /// Rule that does not build
    #[error(transparent)]
    InvalidRule(#[from] RuleError),
}

/// `[project]` settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Language of user-facing text; selects locale-specific rules
    pub locale: String,

    /// Digest algorithm for manifests
    pub algorithm: DigestAlgorithm,

    /// Limit for stages without their own
    pub default_timeout_secs: u64,

    /// Revision changed paths are computed against
    pub baseline_ref: String,

    /// Files `scan` covers when no paths are given
    pub sources: Vec<String>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            locale: "en".to_string(),
            algorithm: DigestAlgorithm::default(),
            default_timeout_secs: 600,
            baseline_ref: "HEAD".to_string(),
            sources: ["**/*.ts", "**/*.tsx", "**/*.js", "**/*.jsx", "**/*.mjs", "**/*.cjs"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// A parsed and validated `.qualities.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualitiesConfig {
    /// Project settings
    #[serde(default)]
    pub project: ProjectSettings,

    /// Pipeline stages, in execution order
    #[serde(default, rename = "stage")]
    pub stages: Vec<StageDefinition>,

    /// Optional secondary test suite
    #[serde(default)]
    pub secondary: Option<SecondarySuite>,

    /// Scanner rules
    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleSpec>,

    /// Configuration units
    #[serde(default, rename = "unit")]
    pub units: Vec<ConfigUnit>,
}

impl QualitiesConfig {
    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content)?;
        log::debug!(
            "loaded {} ({} stages, {} rules, {} units)",
            path.display(),
            config.stages.len(),
            config.rules.len(),
            config.units.len()
        );
        Ok(config)
    }

    /// Parse and validate config text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ids, references, globs and rules
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut units: HashMap<String, &str> = HashMap::new();
        for unit in &self.units {
            if let Some(first) = units.insert(unit.id.to_ascii_lowercase(), &unit.id) {
                if first == unit.id {
                    return Err(ConfigError::DuplicateUnit(unit.id.clone()));
                }
                return Err(ConfigError::UnitCaseClash {
                    first: first.to_string(),
                    second: unit.id.clone(),
                });
            }
            check_globs(&unit.id, &unit.files)?;
        }

        let mut stages = HashSet::new();
        for stage in &self.stages {
            if !stages.insert(stage.id.as_str()) {
                return Err(ConfigError::DuplicateStage(stage.id.clone()));
            }
            if stage.command.trim().is_empty() {
                return Err(ConfigError::EmptyCommand(stage.id.clone()));
            }
            if stage.has_unit() && !units.contains_key(stage.config_unit.as_str()) {
                return Err(ConfigError::UnknownUnit {
                    stage: stage.id.clone(),
                    unit: stage.config_unit.clone(),
                });
            }
            check_globs(&stage.id, &stage.files)?;
            check_globs(&stage.id, &stage.requires)?;
        }

        if let Some(secondary) = &self.secondary
            && secondary.command.trim().is_empty()
        {
            return Err(ConfigError::EmptyCommand("secondary".to_string()));
        }

        let mut rules = HashSet::new();
        for rule in &self.rules {
            if !rules.insert(rule.id.as_str()) {
                return Err(ConfigError::DuplicateRule(rule.id.clone()));
            }
            validate_spec(rule)?;
        }

        check_globs("project.sources", &self.project.sources)
    }

    /// Configured locale
    #[must_use]
    pub fn locale(&self) -> Locale {
        Locale::new(&self.project.locale)
    }

    /// Limit for stages without their own
    #[must_use]
    pub const fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.project.default_timeout_secs)
    }
}

fn check_globs(owner: &str, globs: &[String]) -> Result<(), ConfigError> {
    PathGlob::compile_all(globs).map(|_| ()).map_err(|source| ConfigError::InvalidGlob {
        owner: owner.to_string(),
        source,
    })
}

/// Starter `.qualities.toml` written by `qualities init`
pub const STARTER_CONFIG: &str = r#"# qualities: staged verification pipeline
#
# Stages run in the order listed and stop at the first failure.

[project]
locale = "en"
algorithm = "sha256"
default_timeout_secs = 600
baseline_ref = "HEAD"

[[stage]]
id = "policy:scan"
command = "qualities"
args = ["scan"]
kind = "policy"

[[stage]]
id = "typecheck"
command = "npx"
args = ["tsc", "--noEmit"]
kind = "typecheck"
requires = ["tsconfig.json"]

[[stage]]
id = "lint"
command = "npx"
args = ["eslint"]
kind = "lint"
# With --changed-only, changed files matching these globs replace `targets`.
files = ["**/*.ts", "**/*.tsx"]
targets = ["."]
requires = ["package.json"]

[[stage]]
id = "test"
command = "npm"
args = ["test"]
kind = "test"
requires = ["package.json"]

# Optional suite run after a passing test stage when its files changed.
# [secondary]
# dir = "vibecoding"
# tracked = ["vibecoding", "guarded/tests"]
# command = "npm"
# args = ["run", "test:vibecoding"]

[[rule]]
id = "anti_mvp"
message = "placeholder scope marker in code"
terms = ["MVP"]
word_boundary = true

[[rule]]
id = "no_any_cast"
message = "cast to any"
pattern = '\bas\s+any\b'
replacement = "as unknown"

[[rule]]
id = "todo_ticket"
message = "TODO without a ticket reference"
pattern = '\bTODO\b'
region = "comments"
exempt = '[A-Z][A-Z0-9]+-\d+'

# Stages bound to a unit fail while the unit's manifest is stale.
# [[unit]]
# id = "lint-config"
# files = ["eslint.config.js", "tsconfig.json"]
# context = "docs/lint-config.md"
"#;
