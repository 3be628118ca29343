//! Post-condition checks and diagnostic excerpts.
//!
//! A patched document is considered correct when it contains the replacement
//! literal and no longer contains the search literal. The include marker is
//! reported alongside but does not decide the verdict.

use crate::config::schema::Diagnostics;
use crate::edit::{Fingerprint, TextPatch};
use std::fmt;

/// Result of checking a document against a [`TextPatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub replacement_present: bool,
    pub search_absent: bool,
    /// `None` when the patch has no include rule
    pub marker_present: Option<bool>,
    /// `None` when nothing was written and re-read
    pub content_matches: Option<bool>,
}

impl Verification {
    pub fn check(content: &str, patch: &TextPatch) -> Self {
        Self {
            replacement_present: content.contains(&patch.rule.replace),
            search_absent: !content.contains(&patch.rule.search),
            marker_present: patch
                .include
                .as_ref()
                .map(|include| content.contains(&include.marker)),
            content_matches: None,
        }
    }

    /// Also compare the re-read content against what was written.
    pub fn against_written(mut self, written: Fingerprint, reread: &str) -> Self {
        self.content_matches = Some(written.matches(reread));
        self
    }

    pub fn passed(&self) -> bool {
        self.replacement_present && self.search_absent && self.content_matches != Some(false)
    }

    /// Every violated condition, in a stable order.
    pub fn violations(&self, patch: &TextPatch) -> Vec<Violation> {
        let mut violations = Vec::new();
        if !self.search_absent {
            violations.push(Violation::SearchPresent(patch.rule.search.clone()));
        }
        if !self.replacement_present {
            violations.push(Violation::ReplacementMissing(patch.rule.replace.clone()));
        }
        if self.content_matches == Some(false) {
            violations.push(Violation::ContentMismatch);
        }
        violations
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    SearchPresent(String),
    ReplacementMissing(String),
    ContentMismatch,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::SearchPresent(search) => write!(f, "{search} still present"),
            Violation::ReplacementMissing(replace) => write!(f, "{replace} not found"),
            Violation::ContentMismatch => {
                write!(f, "content on disk differs from written content")
            }
        }
    }
}

/// One numbered line of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcerptLine {
    /// 1-based line number
    pub number: usize,
    pub text: String,
}

impl fmt::Display for ExcerptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.number, self.text)
    }
}

/// All lines containing `keyword`.
pub fn keyword_lines(content: &str, keyword: &str) -> Vec<ExcerptLine> {
    if keyword.is_empty() {
        return Vec::new();
    }
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains(keyword))
        .map(|(idx, line)| ExcerptLine {
            number: idx + 1,
            text: line.to_string(),
        })
        .collect()
}

/// Up to `len` lines starting at 1-based line `start`.
pub fn line_window(content: &str, start: usize, len: usize) -> Vec<ExcerptLine> {
    content
        .lines()
        .enumerate()
        .skip(start.saturating_sub(1))
        .take(len)
        .map(|(idx, line)| ExcerptLine {
            number: idx + 1,
            text: line.to_string(),
        })
        .collect()
}

/// Excerpt shown when a document matches neither literal: keyword lines if
/// there are any, otherwise the fixed window.
pub fn diagnostic_excerpt(content: &str, settings: &Diagnostics) -> Vec<ExcerptLine> {
    let hits = keyword_lines(content, &settings.keyword);
    if !hits.is_empty() {
        return hits;
    }
    line_window(content, settings.window_start, settings.window_len)
}
