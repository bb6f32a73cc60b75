//! Drift gate port
//!
//! Lets the pipeline ask whether a configuration unit is still trustworthy
//! without knowing how manifests work.

use crate::core::models::DriftStatus;

/// Answers "is this unit still valid"
#[cfg_attr(test, mockall::automock)]
pub trait DriftGate {
    /// Verify the unit, expiring its artifacts if it drifted
    fn verify(&self, unit: &str) -> DriftStatus;
}
