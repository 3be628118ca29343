use std::fmt;
use xxhash_rust::xxh3::xxh3_64;

/// Fixed-string substitution: every occurrence of `search` becomes `replace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRule {
    /// Literal that must disappear from the document
    pub search: String,
    /// Literal substituted in its place
    pub replace: String,
}

/// A directive line that must be present, inserted after `anchor` when missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRule {
    /// Line whose presence is guaranteed
    pub marker: String,
    /// Pre-existing line the marker is placed after
    pub anchor: String,
}

/// Classification of a document with respect to its [`PatchRule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The search literal was found and replaced
    NewlyPatched,
    /// Only the replacement literal is present
    AlreadyPatched,
    /// Neither literal is present
    PatternAbsent,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::NewlyPatched => write!(f, "newly patched"),
            Outcome::AlreadyPatched => write!(f, "already patched"),
            Outcome::PatternAbsent => write!(f, "pattern absent"),
        }
    }
}

/// What happened to the include marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeStatus {
    /// The patch has no include rule
    NotRequired,
    /// Marker was already in the document
    Present,
    /// Marker was inserted after the anchor
    Inserted,
    /// Marker absent and the anchor could not be found; nothing inserted
    AnchorMissing,
}

impl IncludeRule {
    pub fn new(marker: impl Into<String>, anchor: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            anchor: anchor.into(),
        }
    }

    /// Insert the marker right after the first anchor occurrence unless it is
    /// already present.
    ///
    /// The new line reuses the anchor's line ending, so CRLF files stay CRLF.
    pub fn ensure(&self, content: &mut String) -> IncludeStatus {
        if content.contains(&self.marker) {
            return IncludeStatus::Present;
        }

        let Some(pos) = content.find(&self.anchor) else {
            return IncludeStatus::AnchorMissing;
        };

        let at = pos + self.anchor.len();
        let newline = if content[at..].starts_with("\r\n") {
            "\r\n"
        } else {
            "\n"
        };
        content.insert_str(at, &format!("{newline}{}", self.marker));
        IncludeStatus::Inserted
    }
}

/// Result of running a [`TextPatch`] over a document held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchedText holds the new content; nothing is written until the caller persists it"]
pub struct PatchedText {
    pub content: String,
    pub outcome: Outcome,
    /// Occurrences of the search literal that were replaced
    pub replacements: usize,
    pub include: IncludeStatus,
}

impl PatchedText {
    /// Whether the content differs from the input and needs persisting.
    pub fn is_modified(&self) -> bool {
        self.outcome == Outcome::NewlyPatched || self.include == IncludeStatus::Inserted
    }
}

/// The complete in-memory patch: one substitution plus an optional include.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPatch {
    pub rule: PatchRule,
    pub include: Option<IncludeRule>,
}

impl TextPatch {
    pub fn new(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            rule: PatchRule {
                search: search.into(),
                replace: replace.into(),
            },
            include: None,
        }
    }

    pub fn with_include(mut self, marker: impl Into<String>, anchor: impl Into<String>) -> Self {
        self.include = Some(IncludeRule::new(marker, anchor));
        self
    }

    /// Apply the substitution, then the include check, to `content`.
    ///
    /// The include check runs on the already-substituted text regardless of
    /// the substitution outcome.
    pub fn apply_to(&self, content: &str) -> PatchedText {
        let search = self.rule.search.as_str();
        let replace = self.rule.replace.as_str();

        let replacements = content.matches(search).count();
        let (mut patched, outcome) = if replacements > 0 {
            (content.replace(search, replace), Outcome::NewlyPatched)
        } else if content.contains(replace) {
            (content.to_string(), Outcome::AlreadyPatched)
        } else {
            (content.to_string(), Outcome::PatternAbsent)
        };

        let include = match &self.include {
            Some(rule) => rule.ensure(&mut patched),
            None => IncludeStatus::NotRequired,
        };

        PatchedText {
            content: patched,
            outcome,
            replacements,
            include,
        }
    }
}

/// xxh3 digest of a document, used to confirm that what is on disk after a
/// write is exactly what was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
    pub fn of(text: &str) -> Self {
        Fingerprint(xxh3_64(text.as_bytes()))
    }

    pub fn matches(&self, text: &str) -> bool {
        *self == Fingerprint::of(text)
    }
}
