//! Version control port
//!
//! Defines the interface for asking which paths changed.

/// Source of changed paths relative to a baseline
///
/// `Err` is the "unavailable" signal (not a repository, bad baseline ref),
/// which callers must keep distinct from an empty list.
#[cfg_attr(test, mockall::automock)]
pub trait DiffProvider {
    /// Paths changed relative to the baseline, `/`-separated, relative to the root
    fn changed_paths(&self) -> anyhow::Result<Vec<String>>;
}
