//! Path globs
//!
//! Globs select files for rules, stage narrowing and configuration units.
//! Paths are matched in normalized form: relative, `/`-separated.
//!
//! ```
//! use qualities::core::models::PathGlob;
//!
//! let g = PathGlob::new("src/**/*.ts").unwrap();
//! assert!(g.matches("src/a/b.ts"));
//! assert!(!g.matches("test/b.ts"));
//! ```

use std::path::{Component, Path};

use regex::Regex;
use thiserror::Error;

/// Errors from compiling a glob
#[derive(Debug, Error)]
pub enum GlobError {
    /// Glob string was empty
    #[error("empty glob")]
    Empty,

    /// Invalid glob pattern syntax
    #[error("invalid glob pattern: {0}")]
    Invalid(String),
}

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct PathGlob {
    /// Original pattern string
    pattern: String,

    /// Compiled regex for matching
    regex: Regex,
}

impl PartialEq for PathGlob {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for PathGlob {}

impl PathGlob {
    /// Compile a glob
    ///
    /// A pattern without metacharacters matches that exact path and, when it
    /// names a directory, everything below it.
    pub fn new(pattern: &str) -> Result<Self, GlobError> {
        let trimmed = pattern.trim().trim_start_matches("./");
        if trimmed.is_empty() {
            return Err(GlobError::Empty);
        }
        let regex = if Self::has_meta(trimmed) {
            Self::glob_to_regex(trimmed)?
        } else {
            let exact = regex::escape(trimmed.trim_end_matches('/'));
            Regex::new(&format!("^{exact}(?:/.*)?$")).map_err(|e| GlobError::Invalid(e.to_string()))?
        };
        Ok(Self {
            pattern: trimmed.to_string(),
            regex,
        })
    }

    /// Compile a list of globs
    pub fn compile_all(patterns: &[String]) -> Result<Vec<Self>, GlobError> {
        patterns.iter().map(|p| Self::new(p)).collect()
    }

    /// The pattern as written
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Check if a normalized path matches this pattern
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.regex.is_match(path.trim_start_matches("./"))
    }

    /// Whether any glob in `globs` matches
    #[must_use]
    pub fn any_match(globs: &[Self], path: &str) -> bool {
        globs.iter().any(|g| g.matches(path))
    }

    fn has_meta(s: &str) -> bool {
        s.contains(['*', '?', '['])
    }

    /// Convert a glob pattern to a regex
    fn glob_to_regex(glob: &str) -> Result<Regex, GlobError> {
        let mut regex = String::with_capacity(glob.len() * 2);
        regex.push('^');

        let chars: Vec<char> = glob.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            match chars[i] {
                '*' => {
                    if i + 1 < chars.len() && chars[i + 1] == '*' {
                        if i + 2 < chars.len() && chars[i + 2] == '/' {
                            // **/ matches zero or more directories
                            regex.push_str("(?:[^/]+/)*");
                            i += 3;
                            continue;
                        }
                        regex.push_str(".*");
                        i += 2;
                        continue;
                    }
                    regex.push_str("[^/]*");
                },
                '?' => regex.push_str("[^/]"),
                '.' => regex.push_str("\\."),
                '/' => regex.push('/'),
                '[' => {
                    let start = i;
                    i += 1;
                    while i < chars.len() && chars[i] != ']' {
                        i += 1;
                    }
                    if i >= chars.len() {
                        return Err(GlobError::Invalid(format!("unclosed character class: {glob}")));
                    }
                    let class: String = chars[start..=i].iter().collect();
                    regex.push_str(&class);
                },
                c => {
                    if "^$+{}|()\\".contains(c) {
                        regex.push('\\');
                    }
                    regex.push(c);
                },
            }
            i += 1;
        }

        regex.push('$');

        Regex::new(&regex).map_err(|e| GlobError::Invalid(e.to_string()))
    }
}

impl std::fmt::Display for PathGlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Normalize a path to relative, `/`-separated form
///
/// `.` components and a leading `./` are dropped; `..` is kept as written.
#[must_use]
pub fn normalize_path(path: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => parts.push("..".to_string()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {},
        }
    }
    parts.join("/")
}
