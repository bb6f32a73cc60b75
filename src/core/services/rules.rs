//! Scan rules
//!
//! A check is anything that turns a set of sources into violations. The
//! pipeline never sees how a check works; the rules here are built on the
//! lexical scanner, but an AST-based check would plug into the same trait.
//!
//! - [`PatternRule`] - forbidden pattern in code (or comments)
//! - [`UniqueClaimRule`] - a capability may be claimed by only one file
//! - [`RuleSet`] - rules built from configuration for one locale

use std::collections::BTreeMap;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::scanner::{MaskedSource, Region, mask};
use crate::core::models::{GlobError, Locale, PathGlob, Violation, sort_violations};
use crate::core::ports::ContentReader;

/// Errors building rules from configuration
#[derive(Debug, Error)]
pub enum RuleError {
    /// Regex failed to compile
    #[error("rule '{rule}': invalid regex: {source}")]
    InvalidRegex {
        /// Rule id
        rule: String,
        /// Regex error
        #[source]
        source: regex::Error,
    },

    /// File glob failed to compile
    #[error("rule '{rule}': {source}")]
    InvalidGlob {
        /// Rule id
        rule: String,
        /// Glob error
        #[source]
        source: GlobError,
    },

    /// Literal set contains no usable term
    #[error("rule '{0}': literal set is empty")]
    EmptyTerms(String),

    /// None of terms, pattern or claim given
    #[error("rule '{0}': one of `terms`, `pattern` or `claim` is required")]
    NoMatcher(String),

    /// More than one of terms, pattern or claim given
    #[error("rule '{0}': `terms`, `pattern` and `claim` are mutually exclusive")]
    ConflictingMatchers(String),

    /// Claim regex without a capture group naming the capability
    #[error("rule '{0}': claim pattern needs a capture group")]
    ClaimWithoutGroup(String),

    /// Selected rule id does not exist
    #[error("unknown rule: {0}")]
    UnknownRule(String),
}

/// A rule as written in `.qualities.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Rule id reported on violations
    pub id: String,

    /// Violation message
    pub message: String,

    /// Literal terms (matched literally, any of them)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub terms: Vec<String>,

    /// Raw regex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Claim regex; capture group 1 names the claimed capability
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim: Option<String>,

    /// Wrap the literal set in word boundaries
    #[serde(default)]
    pub word_boundary: bool,

    /// Case-insensitive matching
    #[serde(default)]
    pub ignore_case: bool,

    /// Text region the rule sees
    #[serde(default)]
    pub region: Region,

    /// Lines that also match this regex are not reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exempt: Option<String>,

    /// Globs restricting which files the rule applies to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,

    /// Locales the rule is active for (empty = all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locales: Vec<String>,

    /// Replacement used by the fix step (regex expansion syntax)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

/// A file loaded for scanning
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Normalized relative path
    pub path: String,
    /// Original text
    pub content: String,
    /// Region views of the text
    pub masked: MaskedSource,
}

impl SourceFile {
    /// Build from path and content
    #[must_use]
    pub fn new(path: &str, content: String) -> Self {
        let masked = mask(&content);
        Self {
            path: path.to_string(),
            content,
            masked,
        }
    }
}

/// A file that could not be scanned
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    /// Path as requested
    pub path: String,
    /// Why it was skipped
    pub error: String,
}

/// The files one scan invocation runs over
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    files: Vec<SourceFile>,
}

impl SourceSet {
    /// Build from already-loaded files
    #[must_use]
    pub const fn new(files: Vec<SourceFile>) -> Self {
        Self { files }
    }

    /// Read `paths` through `reader`
    ///
    /// Unreadable or non-UTF-8 files are logged once and returned as skipped;
    /// loading never fails as a whole.
    pub fn load(reader: &dyn ContentReader, paths: &[String]) -> (Self, Vec<SkippedFile>) {
        let mut files = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();

        for path in paths {
            let loaded = reader
                .read(Path::new(path))
                .map_err(|e| e.to_string())
                .and_then(|bytes| String::from_utf8(bytes).map_err(|_| "not valid UTF-8".to_string()));
            match loaded {
                Ok(content) => files.push(SourceFile::new(path, content)),
                Err(error) => {
                    log::warn!("skipping {path}: {error}");
                    skipped.push(SkippedFile {
                        path: path.clone(),
                        error,
                    });
                },
            }
        }

        (Self { files }, skipped)
    }

    /// Loaded files
    #[must_use]
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Number of loaded files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing was loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// A named check over a source set
pub trait Check {
    /// Id reported on violations
    fn rule_id(&self) -> &str;

    /// Run over every applicable file
    fn run(&self, sources: &SourceSet) -> Vec<Violation>;
}

/// Forbidden pattern, reported once per matching line
#[derive(Debug, Clone)]
pub struct PatternRule {
    id: String,
    message: String,
    matcher: Regex,
    region: Region,
    exempt: Option<Regex>,
    files: Vec<PathGlob>,
    replacement: Option<String>,
}

impl PatternRule {
    /// Rule from a raw regex
    pub fn regex(id: &str, pattern: &str, message: &str) -> Result<Self, RuleError> {
        Ok(Self::with_matcher(id, message, compile(id, pattern, false)?))
    }

    /// Rule from a literal set, optionally wrapped in word boundaries
    pub fn literals(
        id: &str,
        terms: &[&str],
        word_boundary: bool,
        message: &str,
    ) -> Result<Self, RuleError> {
        let terms: Vec<String> = terms.iter().map(|t| (*t).to_string()).collect();
        let pattern = literal_pattern(id, &terms, word_boundary)?;
        Ok(Self::with_matcher(id, message, compile(id, &pattern, false)?))
    }

    fn with_matcher(id: &str, message: &str, matcher: Regex) -> Self {
        Self {
            id: id.to_string(),
            message: message.to_string(),
            matcher,
            region: Region::Code,
            exempt: None,
            files: Vec::new(),
            replacement: None,
        }
    }

    /// Match against a different region
    #[must_use]
    pub const fn in_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Skip lines that also match `exempt`
    pub fn with_exempt(mut self, exempt: &str) -> Result<Self, RuleError> {
        self.exempt = Some(compile(&self.id, exempt, false)?);
        Ok(self)
    }

    /// Restrict the rule to files matching `globs`
    pub fn with_files(mut self, globs: &[String]) -> Result<Self, RuleError> {
        self.files = PathGlob::compile_all(globs).map_err(|source| RuleError::InvalidGlob {
            rule: self.id.clone(),
            source,
        })?;
        Ok(self)
    }

    /// Set the fix-step replacement
    #[must_use]
    pub fn with_replacement(mut self, replacement: &str) -> Self {
        self.replacement = Some(replacement.to_string());
        self
    }

    /// The compiled matcher
    #[must_use]
    pub const fn matcher(&self) -> &Regex {
        &self.matcher
    }

    /// Region the rule sees
    #[must_use]
    pub const fn region(&self) -> Region {
        self.region
    }

    /// Fix-step replacement, if any
    #[must_use]
    pub fn replacement(&self) -> Option<&str> {
        self.replacement.as_deref()
    }

    /// Whether the rule applies to `path`
    #[must_use]
    pub fn applies_to(&self, path: &str) -> bool {
        self.files.is_empty() || PathGlob::any_match(&self.files, path)
    }

    /// Scan one file's region view, one violation per matching line
    ///
    /// Each line is matched run by run, so a match never spans text from
    /// another region.
    #[must_use]
    pub fn scan_file(&self, file: &SourceFile) -> Vec<Violation> {
        file.masked
            .line_runs(self.region)
            .into_iter()
            .enumerate()
            .filter(|(_, runs)| {
                !self.exempt.as_ref().is_some_and(|e| runs.iter().any(|(_, run)| e.is_match(run)))
            })
            .filter_map(|(idx, runs)| {
                runs.iter().find_map(|(_, run)| self.matcher.find(run)).map(|m| {
                    Violation::new(&self.id, &file.path, idx + 1, &self.message)
                        .with_snippet(m.as_str())
                })
            })
            .collect()
    }
}

impl Check for PatternRule {
    fn rule_id(&self) -> &str {
        &self.id
    }

    fn run(&self, sources: &SourceSet) -> Vec<Violation> {
        sources
            .files()
            .iter()
            .filter(|f| self.applies_to(&f.path))
            .flat_map(|f| self.scan_file(f))
            .collect()
    }
}

/// A capability that at most one file may claim
///
/// Claims are gathered over the whole source set first; uniqueness is then
/// checked in a single pass over the collected claims.
#[derive(Debug, Clone)]
pub struct UniqueClaimRule {
    id: String,
    message: String,
    matcher: Regex,
    region: Region,
    files: Vec<PathGlob>,
}

/// One file claiming a capability
#[derive(Debug, Clone, PartialEq, Eq)]
struct Claim {
    file: String,
    line: usize,
    text: String,
}

impl UniqueClaimRule {
    /// Rule from a claim regex whose first group names the capability
    pub fn new(id: &str, pattern: &str, message: &str) -> Result<Self, RuleError> {
        let matcher = compile(id, pattern, false)?;
        if matcher.captures_len() < 2 {
            return Err(RuleError::ClaimWithoutGroup(id.to_string()));
        }
        Ok(Self {
            id: id.to_string(),
            message: message.to_string(),
            matcher,
            region: Region::Code,
            files: Vec::new(),
        })
    }

    /// Look for claims in a different region
    #[must_use]
    pub const fn in_region(mut self, region: Region) -> Self {
        self.region = region;
        self
    }

    /// Restrict the rule to files matching `globs`
    pub fn with_files(mut self, globs: &[String]) -> Result<Self, RuleError> {
        self.files = PathGlob::compile_all(globs).map_err(|source| RuleError::InvalidGlob {
            rule: self.id.clone(),
            source,
        })?;
        Ok(self)
    }

    fn collect_claims(&self, sources: &SourceSet) -> BTreeMap<String, Vec<Claim>> {
        let mut claims: BTreeMap<String, Vec<Claim>> = BTreeMap::new();
        for file in sources.files() {
            if !self.files.is_empty() && !PathGlob::any_match(&self.files, &file.path) {
                continue;
            }
            for (idx, runs) in file.masked.line_runs(self.region).iter().enumerate() {
                for caps in runs.iter().flat_map(|(_, run)| self.matcher.captures_iter(run)) {
                    let Some(key) = caps.get(1) else { continue };
                    claims.entry(key.as_str().to_string()).or_default().push(Claim {
                        file: file.path.clone(),
                        line: idx + 1,
                        text: caps.get(0).map_or("", |m| m.as_str()).to_string(),
                    });
                }
            }
        }
        claims
    }
}

impl Check for UniqueClaimRule {
    fn rule_id(&self) -> &str {
        &self.id
    }

    fn run(&self, sources: &SourceSet) -> Vec<Violation> {
        let mut violations = Vec::new();
        for (capability, claims) in self.collect_claims(sources) {
            let mut claimants: Vec<&str> = claims.iter().map(|c| c.file.as_str()).collect();
            claimants.sort_unstable();
            claimants.dedup();
            if claimants.len() < 2 {
                continue;
            }
            for claim in &claims {
                let others: Vec<&str> =
                    claimants.iter().copied().filter(|f| *f != claim.file).collect();
                let message =
                    format!("{} ('{capability}' also claimed by {})", self.message, others.join(", "));
                violations.push(
                    Violation::new(&self.id, &claim.file, claim.line, &message)
                        .with_snippet(&claim.text),
                );
            }
        }
        violations
    }
}

/// A built rule
#[derive(Debug, Clone)]
pub enum Rule {
    /// Pattern rule
    Pattern(PatternRule),
    /// Unique-claim rule
    Claim(UniqueClaimRule),
}

impl Rule {
    /// The pattern rule, if this is one
    #[must_use]
    pub const fn as_pattern(&self) -> Option<&PatternRule> {
        match self {
            Self::Pattern(rule) => Some(rule),
            Self::Claim(_) => None,
        }
    }
}

impl Check for Rule {
    fn rule_id(&self) -> &str {
        match self {
            Self::Pattern(rule) => rule.rule_id(),
            Self::Claim(rule) => rule.rule_id(),
        }
    }

    fn run(&self, sources: &SourceSet) -> Vec<Violation> {
        match self {
            Self::Pattern(rule) => rule.run(sources),
            Self::Claim(rule) => rule.run(sources),
        }
    }
}

/// Rules active for one locale, in configuration order
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Build every rule active under `locale`
    pub fn build(specs: &[RuleSpec], locale: &Locale) -> Result<Self, RuleError> {
        let mut rules = Vec::new();
        for spec in specs {
            if !locale.enables(&spec.locales) {
                log::debug!("rule {} disabled for locale {locale}", spec.id);
                continue;
            }
            rules.push(build_rule(spec)?);
        }
        Ok(Self { rules })
    }

    /// Build from already-constructed rules
    #[must_use]
    pub const fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Keep only the rules named in `ids`
    pub fn retain_ids(&mut self, ids: &[String]) -> Result<(), RuleError> {
        if let Some(unknown) = ids.iter().find(|id| !self.rules.iter().any(|r| r.rule_id() == *id)) {
            return Err(RuleError::UnknownRule(unknown.clone()));
        }
        self.rules.retain(|r| ids.iter().any(|id| id == r.rule_id()));
        Ok(())
    }

    /// Rules in order
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Pattern rule by id
    #[must_use]
    pub fn pattern(&self, id: &str) -> Option<&PatternRule> {
        self.rules.iter().filter_map(Rule::as_pattern).find(|r| r.rule_id() == id)
    }

    /// Whether no rule is active
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule; violations ordered by file, line, then rule order
    #[must_use]
    pub fn run(&self, sources: &SourceSet) -> Vec<Violation> {
        let mut violations: Vec<Violation> = self.rules.iter().flat_map(|r| r.run(sources)).collect();
        sort_violations(&mut violations);
        violations
    }
}

/// Outcome of scanning a list of files
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanReport {
    /// Files actually scanned
    pub files_scanned: usize,
    /// Files skipped because they could not be read
    pub skipped: Vec<SkippedFile>,
    /// Violations, ordered
    pub violations: Vec<Violation>,
}

impl ScanReport {
    /// A scan passes when it reported no violation
    #[must_use]
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Load `paths` and run `rules` over them
#[must_use]
pub fn scan(rules: &RuleSet, reader: &dyn ContentReader, paths: &[String]) -> (ScanReport, SourceSet) {
    let (sources, skipped) = SourceSet::load(reader, paths);
    let violations = rules.run(&sources);
    let report = ScanReport {
        files_scanned: sources.len(),
        skipped,
        violations,
    };
    (report, sources)
}

/// Check that a rule spec builds, regardless of locale
pub fn validate_spec(spec: &RuleSpec) -> Result<(), RuleError> {
    build_rule(spec).map(|_| ())
}

fn build_rule(spec: &RuleSpec) -> Result<Rule, RuleError> {
    let given = usize::from(!spec.terms.is_empty())
        + usize::from(spec.pattern.is_some())
        + usize::from(spec.claim.is_some());
    if given == 0 {
        return Err(RuleError::NoMatcher(spec.id.clone()));
    }
    if given > 1 {
        return Err(RuleError::ConflictingMatchers(spec.id.clone()));
    }

    if let Some(claim) = &spec.claim {
        let matcher = compile(&spec.id, claim, spec.ignore_case)?;
        if matcher.captures_len() < 2 {
            return Err(RuleError::ClaimWithoutGroup(spec.id.clone()));
        }
        let rule = UniqueClaimRule {
            id: spec.id.clone(),
            message: spec.message.clone(),
            matcher,
            region: spec.region,
            files: Vec::new(),
        }
        .with_files(&spec.files)?;
        return Ok(Rule::Claim(rule));
    }

    let pattern = match &spec.pattern {
        Some(pattern) => pattern.clone(),
        None => literal_pattern(&spec.id, &spec.terms, spec.word_boundary)?,
    };
    let mut rule = PatternRule::with_matcher(
        &spec.id,
        &spec.message,
        compile(&spec.id, &pattern, spec.ignore_case)?,
    )
    .in_region(spec.region)
    .with_files(&spec.files)?;
    if let Some(exempt) = &spec.exempt {
        rule.exempt = Some(compile(&spec.id, exempt, spec.ignore_case)?);
    }
    if let Some(replacement) = &spec.replacement {
        rule = rule.with_replacement(replacement);
    }
    Ok(Rule::Pattern(rule))
}

/// Regex source for a literal set
fn literal_pattern(id: &str, terms: &[String], word_boundary: bool) -> Result<String, RuleError> {
    let escaped: Vec<String> =
        terms.iter().map(|t| t.trim()).filter(|t| !t.is_empty()).map(regex::escape).collect();
    if escaped.is_empty() {
        return Err(RuleError::EmptyTerms(id.to_string()));
    }
    let alternation = escaped.join("|");
    Ok(if word_boundary {
        format!(r"\b(?:{alternation})\b")
    } else {
        format!("(?:{alternation})")
    })
}

fn compile(id: &str, pattern: &str, ignore_case: bool) -> Result<Regex, RuleError> {
    RegexBuilder::new(pattern).case_insensitive(ignore_case).build().map_err(|source| {
        RuleError::InvalidRegex {
            rule: id.to_string(),
            source,
        }
    })
}
