//! React Native version filtering for patch targets.
//!
//! A patch set may carry a `version_range` such as `">=0.81.0, <0.82.0"`.
//! Each target's React Native version (from `package.json` or from the
//! Gradle artifact directory name) is checked against it before patching.

use semver::{Version, VersionReq};
use std::fmt;

/// Errors during version filtering
#[derive(Debug, Clone)]
pub enum VersionError {
    /// Target version is not valid semver
    InvalidVersion { value: String, source: String },
    /// `version_range` is not a valid semver requirement
    InvalidRequirement { value: String, source: String },
}

impl fmt::Display for VersionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionError::InvalidVersion { value, source } => {
                write!(f, "invalid version '{}': {}", value, source)
            }
            VersionError::InvalidRequirement { value, source } => {
                write!(f, "invalid version requirement '{}': {}", value, source)
            }
        }
    }
}

impl std::error::Error for VersionError {}

/// Check a version against an optional requirement string.
///
/// `None` or a blank requirement matches everything.
///
/// ```
/// use sformat_patcher::config::version::matches_requirement;
///
/// assert!(matches_requirement("0.81.5", Some(">=0.81.0")).unwrap());
/// assert!(!matches_requirement("0.80.2", Some(">=0.81.0")).unwrap());
/// assert!(matches_requirement("0.74.0", None).unwrap());
/// ```
pub fn matches_requirement(
    version: &str,
    requirement: Option<&str>,
) -> Result<bool, VersionError> {
    let req_str = match requirement.map(str::trim) {
        None | Some("") => return Ok(true),
        Some(req) => req,
    };

    let version = Version::parse(version.trim()).map_err(|e| VersionError::InvalidVersion {
        value: version.to_string(),
        source: e.to_string(),
    })?;

    let req = VersionReq::parse(req_str).map_err(|e| VersionError::InvalidRequirement {
        value: req_str.to_string(),
        source: e.to_string(),
    })?;

    Ok(req.matches(&version))
}

/// Extract the version from a Gradle transform directory name.
///
/// `react-android-0.81.5-debug` with prefix `react-android-` yields
/// `0.81.5`. A trailing all-alphabetic build type segment is dropped; a
/// genuine prerelease like `0.82.0-rc.1` is kept.
pub fn artifact_version(dir_name: &str, prefix: &str) -> Option<String> {
    let rest = dir_name.strip_prefix(prefix)?;

    let candidate = match rest.rsplit_once('-') {
        Some((head, tail))
            if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            head
        }
        _ => rest,
    };

    Version::parse(candidate).ok().map(|v| v.to_string())
}
