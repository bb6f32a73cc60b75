//! Port traits (interfaces) for external dependencies
//!
//! These traits define the boundaries between core logic and external
//! systems (processes, filesystem, version control).
//!
//! Implementations live in the `adapters` module.
//!
//! ## Design Principle
//!
//! The core depends only on these traits, never on concrete implementations.
//! Pipeline, scope and drift logic can be exercised with in-memory fakes.

mod baseline;
mod content;
mod drift;
mod runner;
mod vcs;
mod workspace;

pub use baseline::BaselineStore;
pub use content::{ContentReader, ContextArtifacts, ManifestStore};
pub use drift::DriftGate;
pub use runner::{Invocation, StageRunner};
pub use vcs::DiffProvider;
pub use workspace::Workspace;

#[cfg(test)]
pub use baseline::MockBaselineStore;
#[cfg(test)]
pub use content::{MockContentReader, MockContextArtifacts, MockManifestStore};
#[cfg(test)]
pub use drift::MockDriftGate;
#[cfg(test)]
pub use runner::MockStageRunner;
#[cfg(test)]
pub use vcs::MockDiffProvider;
#[cfg(test)]
pub use workspace::MockWorkspace;
