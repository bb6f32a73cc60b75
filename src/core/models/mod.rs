//! Domain models for qualities
//!
//! Pure data structures with no I/O dependencies.
//!
//! - [`StageDefinition`] - One ordered step of the pipeline
//! - [`ExecutionResult`] / [`PipelineReport`] - What running stages produced
//! - [`Violation`] - A defect reported by a scan
//! - [`UnitManifest`] / [`DriftStatus`] - Content-addressed unit state
//! - [`ScopeDecisionInputs`] / [`ScopeDecision`] - Selective scope evidence
//! - [`PathGlob`] - File selection patterns
//! - [`Locale`] - Language of user-facing text, fixed at rule construction

mod execution;
mod locale;
mod manifest;
mod path_glob;
mod scope;
mod stage;
mod violation;

pub use execution::{
    ExecutionResult, FailureKind, PipelineReport, StageReport, StageStatus, Termination,
};
pub use locale::Locale;
pub use manifest::{
    ConfigUnit, DigestAlgorithm, DriftReason, DriftStatus, ManifestEntry, UnitManifest, unit_digest,
};
pub use path_glob::{GlobError, PathGlob, normalize_path};
pub use scope::{DecisionReason, FileScope, FileSelection, ScopeDecision, ScopeDecisionInputs};
pub use stage::{RunScope, SecondarySuite, StageDefinition, StageKind, StageMode, StageScope};
pub use violation::{Violation, sort_violations};
