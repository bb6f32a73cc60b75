//! Scope baseline port
//!
//! The persisted "last verified" marker.

use chrono::{DateTime, Utc};

/// Reads and writes the last-verified timestamp
#[cfg_attr(test, mockall::automock)]
pub trait BaselineStore {
    /// The raw stored value, `None` if never written
    fn load(&self) -> anyhow::Result<Option<String>>;

    /// Replace the stored value
    fn save(&self, at: DateTime<Utc>) -> anyhow::Result<()>;
}
