//! Locale value for rule configuration
//!
//! Some rule sets only make sense for one language of user-facing text. The
//! active locale is chosen once, when rules are built, and never read from
//! the environment during a scan.

use serde::{Deserialize, Serialize};

/// A language tag such as `en` or `ja`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locale(String);

impl Locale {
    /// Create a locale from a tag; tags compare case-insensitively
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self(tag.trim().to_lowercase())
    }

    /// The normalized tag
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether a rule restricted to `locales` is active under this locale
    ///
    /// An empty restriction list means the rule is locale-independent.
    #[must_use]
    pub fn enables(&self, locales: &[String]) -> bool {
        locales.is_empty() || locales.iter().any(|l| Self::new(l) == *self)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self::new("en")
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
