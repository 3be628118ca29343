//! Patch applicator - runs the patch-and-verify cycle against files
//!
//! For each target file:
//! - Filters by React Native version when the patch set has a `version_range`
//! - Reads the file, applies the in-memory [`TextPatch`]
//! - Writes the result back only if something changed
//! - Re-reads the file and verifies the post-condition

use crate::config::schema::{Diagnostics, PatchConfig};
use crate::config::version::{matches_requirement, VersionError};
use crate::edit::{Fingerprint, IncludeStatus, Outcome, TextPatch};
use crate::locate::Target;
use crate::verify::{diagnostic_excerpt, keyword_lines, ExcerptLine, Verification, Violation};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("target file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("version error: {0}")]
    Version(#[from] VersionError),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PatchOptions {
    /// Compute and verify the patch in memory without writing
    pub dry_run: bool,
}

/// Final classification of one patch-and-verify cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failure(Vec<Violation>),
    /// Neither literal was found; nothing to verify against
    Unknown,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Success => write!(f, "SUCCESS"),
            Verdict::Failure(_) => write!(f, "FAILURE"),
            Verdict::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Everything that happened to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchReport carries the verdict and should be reported"]
pub struct PatchReport {
    pub file: PathBuf,
    pub outcome: Outcome,
    pub replacements: usize,
    pub include: IncludeStatus,
    /// Whether the file on disk was overwritten
    pub written: bool,
    pub verification: Verification,
    pub verdict: Verdict,
    /// Nearby lines, populated when the outcome is [`Outcome::PatternAbsent`]
    pub excerpt: Vec<ExcerptLine>,
    pub original: String,
    pub patched: String,
}

impl PatchReport {
    /// Whether patching changed (or in a dry run, would change) the content.
    pub fn changed(&self) -> bool {
        self.original != self.patched
    }
}

/// Result of processing one [`Target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchResult {
    Processed(Box<PatchReport>),
    SkippedVersion { file: PathBuf, reason: String },
}

fn read_document(path: &Path) -> Result<String, PatchError> {
    fs::read_to_string(path).map_err(|source| PatchError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Run the patch-and-verify cycle on a single file.
///
/// A missing file fails with [`PatchError::NotFound`] before anything is
/// read or written. A missing anchor or absent pattern is not an error; it
/// shows up in the report's `include` and `outcome`.
pub fn patch_file(
    path: &Path,
    patch: &TextPatch,
    diagnostics: &Diagnostics,
    options: PatchOptions,
) -> Result<PatchReport, PatchError> {
    if !path.exists() {
        return Err(PatchError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let original = read_document(path)?;
    let patched = patch.apply_to(&original);

    let excerpt = if patched.outcome == Outcome::PatternAbsent {
        diagnostic_excerpt(&original, diagnostics)
    } else {
        Vec::new()
    };

    let written = patched.is_modified() && !options.dry_run;
    let verification = if options.dry_run {
        Verification::check(&patched.content, patch)
    } else {
        if written {
            fs::write(path, &patched.content).map_err(|source| PatchError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        let reread = read_document(path)?;
        Verification::check(&reread, patch)
            .against_written(Fingerprint::of(&patched.content), &reread)
    };

    let verdict = if patched.outcome == Outcome::PatternAbsent {
        Verdict::Unknown
    } else if verification.passed() {
        Verdict::Success
    } else {
        Verdict::Failure(verification.violations(patch))
    };

    Ok(PatchReport {
        file: path.to_path_buf(),
        outcome: patched.outcome,
        replacements: patched.replacements,
        include: patched.include,
        written,
        verification,
        verdict,
        excerpt,
        original,
        patched: patched.content,
    })
}

/// Why `target` falls outside the patch set's `version_range`, if it does.
///
/// Targets with an unknown version are never skipped.
pub fn version_skip_reason(
    target: &Target,
    config: &PatchConfig,
) -> Result<Option<String>, VersionError> {
    let Some(version) = target.version.as_deref() else {
        return Ok(None);
    };
    let requirement = config.meta.version_range.as_deref();
    if matches_requirement(version, requirement)? {
        return Ok(None);
    }
    Ok(Some(format!(
        "react-native {version} does not satisfy version_range {}",
        requirement.unwrap_or("").trim()
    )))
}

/// Apply a patch configuration to resolved targets, one result per target.
pub fn apply_patches(
    config: &PatchConfig,
    targets: &[Target],
    options: PatchOptions,
) -> Vec<(Target, Result<PatchResult, PatchError>)> {
    let patch = config.text_patch();
    targets
        .iter()
        .map(|target| {
            let result = match version_skip_reason(target, config) {
                Ok(Some(reason)) => Ok(PatchResult::SkippedVersion {
                    file: target.file.clone(),
                    reason,
                }),
                Ok(None) => patch_file(&target.file, &patch, &config.diagnostics, options)
                    .map(|report| PatchResult::Processed(Box::new(report))),
                Err(e) => Err(PatchError::Version(e)),
            };
            (target.clone(), result)
        })
        .collect()
}

/// Read-only view of a file's patch state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetStatus {
    pub file: PathBuf,
    pub verification: Verification,
    /// Every line containing the diagnostics keyword
    pub preview: Vec<ExcerptLine>,
}

impl TargetStatus {
    /// True once the search literal is gone.
    pub fn is_clean(&self) -> bool {
        self.verification.search_absent
    }
}

/// Inspect a file without modifying it.
pub fn inspect_file(
    path: &Path,
    patch: &TextPatch,
    diagnostics: &Diagnostics,
) -> Result<TargetStatus, PatchError> {
    if !path.exists() {
        return Err(PatchError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = read_document(path)?;
    Ok(TargetStatus {
        file: path.to_path_buf(),
        verification: Verification::check(&content, patch),
        preview: keyword_lines(&content, &diagnostics.keyword),
    })
}

/// Result of inspecting one [`Target`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InspectResult {
    Inspected(TargetStatus),
    SkippedVersion { file: PathBuf, reason: String },
}

/// Inspect resolved targets without mutating any file.
pub fn check_patches(
    config: &PatchConfig,
    targets: &[Target],
) -> Vec<(Target, Result<InspectResult, PatchError>)> {
    let patch = config.text_patch();
    targets
        .iter()
        .map(|target| {
            let result = match version_skip_reason(target, config) {
                Ok(Some(reason)) => Ok(InspectResult::SkippedVersion {
                    file: target.file.clone(),
                    reason,
                }),
                Ok(None) => inspect_file(&target.file, &patch, &config.diagnostics)
                    .map(InspectResult::Inspected),
                Err(e) => Err(PatchError::Version(e)),
            };
            (target.clone(), result)
        })
        .collect()
}
