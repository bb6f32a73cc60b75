//! Business logic services
//!
//! Pure orchestration logic that operates on domain models.
//! Services never touch the filesystem or spawn processes directly;
//! everything external goes through the port traits.
//!
//! - [`scanner`] - Lexical masking of comments and literals
//! - [`rules`] - Pattern and unique-claim checks over a source set
//! - [`fix`] - Opt-in replacement planning after a scan
//! - [`manifest`] - Manifest generation, drift detection, unit expiry
//! - [`scope`] - Secondary-suite decision and changed-only narrowing
//! - [`pipeline`] - Ordered stage execution

pub mod fix;
pub mod manifest;
pub mod pipeline;
pub mod rules;
pub mod scanner;
pub mod scope;

pub use fix::{FileFix, plan_fixes};
pub use manifest::{
    ManifestError, UnitEvidence, UnitStatus, UnitVerifier, check_artifact, check_drift,
    check_stored, compute_manifest, parse_manifest, stamp_artifact, validate_manifest,
    verify_unit,
};
pub use pipeline::{Pipeline, PipelineContext};
pub use rules::{
    Check, PatternRule, Rule, RuleError, RuleSet, RuleSpec, ScanReport, SkippedFile, SourceFile,
    SourceSet, UniqueClaimRule, scan, validate_spec,
};
pub use scanner::{LexState, MaskedSource, Region, code_only, mask};
pub use scope::{ScopeProbe, narrow_files, resolve_secondary_suite};
