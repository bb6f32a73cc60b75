//! Lexical scanner
//!
//! A single left-to-right pass over source text that tracks whether each byte
//! is executable code, comment, or literal text. Pattern rules only ever see
//! the region they ask for, so a banned word inside a user-facing string or a
//! comment is not reported as code.
//!
//! The scanner works on bytes. Every delimiter it cares about is ASCII, and
//! UTF-8 continuation bytes are never ASCII, so byte-level transitions cannot
//! split a character. Masked bytes become spaces and newlines are always kept,
//! which preserves both line numbers and byte offsets.
//!
//! Matchers run over [`MaskedSource::runs`], never over a whole padded line:
//! a pattern that accepts whitespace would otherwise match across the blanks
//! left by a literal or comment.
//!
//! Known limitation: `${...}` inside a template literal is not parsed. Code in
//! an interpolation is treated as template text and never matched.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    /// Executable code
    Normal,
    /// After `//`, until end of line
    InLineComment,
    /// After `/*`, until `*/`
    InBlockComment,
    /// Inside a `'` or `"` string
    InQuotedString(u8),
    /// Inside a backtick template literal
    InTemplateLiteral,
}

/// Which text a rule is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// Executable code only
    #[default]
    Code,
    /// Comment bodies only
    Comments,
}

impl Region {
    const fn class(self) -> ByteClass {
        match self {
            Self::Code => ByteClass::Code,
            Self::Comments => ByteClass::Comment,
        }
    }
}

/// Classification of a single byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteClass {
    Code,
    Comment,
    Literal,
}

/// Source text split into per-region views with identical layout
#[derive(Debug, Clone)]
pub struct MaskedSource {
    code: String,
    comments: String,
    classes: Vec<ByteClass>,
}

impl MaskedSource {
    /// Text of one region; everything else is blanked
    #[must_use]
    pub fn region(&self, region: Region) -> &str {
        match region {
            Region::Code => &self.code,
            Region::Comments => &self.comments,
        }
    }

    /// Maximal stretches of `region` text inside `range`, as `(offset, text)`
    ///
    /// A run never contains a newline or a blanked byte, so its text is a
    /// slice of the original source and starts and ends on character
    /// boundaries.
    #[must_use]
    pub fn runs(&self, region: Region, range: Range<usize>) -> Vec<(usize, &str)> {
        let view = self.region(region);
        let keep = region.class();
        let end = range.end.min(view.len()).min(self.classes.len());
        let mut runs = Vec::new();
        let mut open: Option<usize> = None;

        for i in range.start..end {
            let inside = self.classes[i] == keep && view.as_bytes()[i] != b'\n';
            match (inside, open) {
                (true, None) => open = Some(i),
                (false, Some(start)) => {
                    if let Some(text) = view.get(start..i) {
                        runs.push((start, text));
                    }
                    open = None;
                },
                _ => {},
            }
        }
        if let Some(start) = open
            && let Some(text) = view.get(start..end)
        {
            runs.push((start, text));
        }
        runs
    }

    /// Runs of `region` text grouped by line, in line order
    #[must_use]
    pub fn line_runs(&self, region: Region) -> Vec<Vec<(usize, &str)>> {
        let view = self.region(region);
        let mut offset = 0;
        view.split('\n')
            .map(|line| {
                let runs = self.runs(region, offset..offset + line.len());
                offset += line.len() + 1;
                runs
            })
            .collect()
    }
}

/// Split `source` into a code view and a comment view
///
/// Never fails: an unterminated comment, string or template swallows the rest
/// of the input, exactly as if it ran to end of file.
#[must_use]
pub fn mask(source: &str) -> MaskedSource {
    let classes = classify(source.as_bytes());
    MaskedSource {
        code: project(source.as_bytes(), &classes, ByteClass::Code),
        comments: project(source.as_bytes(), &classes, ByteClass::Comment),
        classes,
    }
}

/// Convenience for the common case: only the executable-code view
#[must_use]
pub fn code_only(source: &str) -> String {
    let classes = classify(source.as_bytes());
    project(source.as_bytes(), &classes, ByteClass::Code)
}

fn project(bytes: &[u8], classes: &[ByteClass], keep: ByteClass) -> String {
    let out: Vec<u8> = bytes
        .iter()
        .zip(classes)
        .map(|(&b, &class)| if b == b'\n' || class == keep { b } else { b' ' })
        .collect();
    // Kept bytes are whole characters and blanked bytes are ASCII spaces.
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

fn classify(bytes: &[u8]) -> Vec<ByteClass> {
    let mut classes = vec![ByteClass::Code; bytes.len()];
    let mut state = LexState::Normal;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            LexState::Normal => match b {
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    classes[i] = ByteClass::Comment;
                    classes[i + 1] = ByteClass::Comment;
                    state = LexState::InLineComment;
                    i += 2;
                },
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    classes[i] = ByteClass::Comment;
                    classes[i + 1] = ByteClass::Comment;
                    state = LexState::InBlockComment;
                    i += 2;
                },
                b'\'' | b'"' => {
                    classes[i] = ByteClass::Literal;
                    state = LexState::InQuotedString(b);
                    i += 1;
                },
                b'`' => {
                    classes[i] = ByteClass::Literal;
                    state = LexState::InTemplateLiteral;
                    i += 1;
                },
                _ => i += 1,
            },
            LexState::InLineComment => {
                if b == b'\n' {
                    state = LexState::Normal;
                } else {
                    classes[i] = ByteClass::Comment;
                }
                i += 1;
            },
            LexState::InBlockComment => {
                // Jump straight to the terminator with a substring search.
                let end = find_subslice(&bytes[i..], b"*/").map_or(bytes.len(), |off| i + off + 2);
                for class in &mut classes[i..end] {
                    *class = ByteClass::Comment;
                }
                i = end;
                state = LexState::Normal;
            },
            LexState::InQuotedString(quote) => {
                classes[i] = ByteClass::Literal;
                if b == b'\\' {
                    if let Some(class) = classes.get_mut(i + 1) {
                        *class = ByteClass::Literal;
                    }
                    i += 2;
                    continue;
                }
                if b == quote {
                    state = LexState::Normal;
                }
                i += 1;
            },
            LexState::InTemplateLiteral => {
                classes[i] = ByteClass::Literal;
                if b == b'\\' {
                    if let Some(class) = classes.get_mut(i + 1) {
                        *class = ByteClass::Literal;
                    }
                    i += 2;
                    continue;
                }
                if b == b'`' {
                    state = LexState::Normal;
                }
                i += 1;
            },
        }
    }

    classes
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
