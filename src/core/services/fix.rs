//! Fix planning
//!
//! Fixing is an explicit step after a scan, never part of it. Planning is
//! pure: it produces new file contents, and the caller decides whether to
//! write them.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use super::rules::{RuleSet, SourceFile, SourceSet};
use crate::core::models::Violation;

/// Planned rewrite of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFix {
    /// Relative path
    pub path: String,
    /// Contents after all replacements
    #[serde(skip)]
    pub updated: String,
    /// Number of replacements made
    pub replacements: usize,
}

/// A single replacement in byte offsets of the original text
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    start: usize,
    end: usize,
    text: String,
}

/// Plan replacements for the reported violations
///
/// Only rules with a replacement participate, and only matches in the rule's
/// region on a reported line are rewritten.
#[must_use]
pub fn plan_fixes(sources: &SourceSet, violations: &[Violation], rules: &RuleSet) -> Vec<FileFix> {
    sources
        .files()
        .iter()
        .filter_map(|file| plan_file(file, violations, rules))
        .collect()
}

fn plan_file(file: &SourceFile, violations: &[Violation], rules: &RuleSet) -> Option<FileFix> {
    let targets: BTreeSet<(&str, usize)> = violations
        .iter()
        .filter(|v| v.file == Path::new(&file.path))
        .map(|v| (v.rule_id.as_str(), v.line))
        .collect();
    if targets.is_empty() {
        return None;
    }

    let line_starts = line_starts(&file.content);
    let mut edits = Vec::new();
    for (rule_id, line) in targets {
        let Some(rule) = rules.pattern(rule_id) else { continue };
        let Some(replacement) = rule.replacement() else { continue };
        let Some(&start) = line_starts.get(line - 1) else { continue };

        let end = file.content[start..].find('\n').map_or(file.content.len(), |off| start + off);
        for (offset, run) in file.masked.runs(rule.region(), start..end) {
            for caps in rule.matcher().captures_iter(run) {
                let Some(m) = caps.get(0) else { continue };
                if m.as_str().is_empty() {
                    continue;
                }
                let mut text = String::new();
                caps.expand(replacement, &mut text);
                edits.push(Edit {
                    start: offset + m.start(),
                    end: offset + m.end(),
                    text,
                });
            }
        }
    }

    let (updated, replacements) = apply_edits(&file.content, edits)?;
    Some(FileFix {
        path: file.path.clone(),
        updated,
        replacements,
    })
}

/// Apply non-overlapping edits; the earliest edit wins an overlap
///
/// Edits that do not sit on character boundaries are dropped.
fn apply_edits(original: &str, mut edits: Vec<Edit>) -> Option<(String, usize)> {
    edits.retain(|e| {
        e.start <= e.end && original.is_char_boundary(e.start) && original.is_char_boundary(e.end)
    });
    edits.sort_by_key(|e| (e.start, e.end));

    let mut out = String::with_capacity(original.len());
    let mut cursor = 0;
    let mut applied = 0;
    for edit in edits {
        if edit.start < cursor {
            continue;
        }
        out.push_str(original.get(cursor..edit.start)?);
        out.push_str(&edit.text);
        cursor = edit.end;
        applied += 1;
    }
    out.push_str(original.get(cursor..)?);

    (applied > 0 && out != original).then_some((out, applied))
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0).chain(text.match_indices('\n').map(|(i, _)| i + 1)).collect()
}
