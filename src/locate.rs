//! Target discovery.
//!
//! The same generated header exists in several places: the project's
//! `node_modules` tree and every Gradle transform output that unpacked the
//! `react-android` AAR. Each configured target resolves to zero or more
//! concrete files, tagged with the React Native version they belong to.

use crate::config::schema::{Location, PatchConfig, TargetDefinition};
use crate::config::version::artifact_version;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// A concrete file to patch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Id of the target definition this file came from
    pub id: String,
    pub file: PathBuf,
    /// React Native version, when it could be determined
    pub version: Option<String>,
}

impl Target {
    /// A target given directly on the command line.
    pub fn explicit(file: impl Into<PathBuf>) -> Self {
        Self {
            id: "file".to_string(),
            file: file.into(),
            version: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    PackageJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to scan Gradle cache: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Roots against which target definitions are resolved.
#[derive(Debug, Clone)]
pub struct DiscoveryContext {
    pub project_root: PathBuf,
    /// Gradle user home; `None` disables Gradle cache targets
    pub gradle_home: Option<PathBuf>,
}

impl DiscoveryContext {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            gradle_home: default_gradle_home(),
        }
    }

    pub fn with_gradle_home(mut self, gradle_home: Option<PathBuf>) -> Self {
        self.gradle_home = gradle_home;
        self
    }
}

/// `$GRADLE_USER_HOME`, falling back to `~/.gradle`.
pub fn default_gradle_home() -> Option<PathBuf> {
    if let Some(path) = env::var_os("GRADLE_USER_HOME") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    home::home_dir().map(|home| home.join(".gradle"))
}

/// Targets found by [`resolve_targets`], plus the problems met on the way.
///
/// A broken `package.json` or an unreadable cache directory only loses the
/// information it would have provided; every other copy is still returned.
#[derive(Debug, Default)]
pub struct Discovery {
    pub targets: Vec<Target>,
    pub warnings: Vec<DiscoveryError>,
}

/// Resolve every target definition in `config`.
///
/// `node-modules` targets always yield one file, whether or not it exists,
/// so that a missing copy is reported rather than silently ignored.
pub fn resolve_targets(config: &PatchConfig, ctx: &DiscoveryContext) -> Discovery {
    let mut discovery = Discovery::default();
    for definition in &config.targets {
        resolve_target(definition, ctx, &mut discovery);
    }
    discovery
}

fn resolve_target(definition: &TargetDefinition, ctx: &DiscoveryContext, out: &mut Discovery) {
    match &definition.location {
        Location::NodeModules { path } => {
            let version = react_native_version(&ctx.project_root).unwrap_or_else(|error| {
                out.warnings.push(error);
                None
            });
            out.targets.push(Target {
                id: definition.id.clone(),
                file: ctx.project_root.join(path),
                version,
            });
        }
        Location::GradleCache {
            artifact_prefix,
            path,
        } => {
            if let Some(gradle_home) = &ctx.gradle_home {
                let found = gradle_cache_targets(
                    &definition.id,
                    gradle_home,
                    artifact_prefix,
                    Path::new(path),
                );
                out.targets.extend(found.targets);
                out.warnings.extend(found.warnings);
            }
        }
    }
}

#[derive(Deserialize)]
struct PackageManifest {
    version: Option<String>,
}

/// Version of the `react-native` package installed under `project_root`.
///
/// Returns `Ok(None)` when the package is not installed.
pub fn react_native_version(project_root: &Path) -> Result<Option<String>, DiscoveryError> {
    let manifest_path = project_root.join("node_modules/react-native/package.json");
    if !manifest_path.exists() {
        return Ok(None);
    }

    let raw = fs::read_to_string(&manifest_path).map_err(|source| DiscoveryError::Io {
        path: manifest_path.clone(),
        source,
    })?;
    let manifest: PackageManifest =
        serde_json::from_str(&raw).map_err(|source| DiscoveryError::PackageJson {
            path: manifest_path,
            source,
        })?;
    Ok(manifest.version)
}

/// Find copies of `relative` inside Gradle transform outputs.
///
/// Handles both cache layouts:
/// - `caches/<gradle-version>/transforms/<hash>/transformed/<artifact>/` (Gradle 8.8+)
/// - `caches/transforms-<n>/<hash>/transformed/<artifact>/` (older)
pub fn gradle_cache_targets(
    id: &str,
    gradle_home: &Path,
    artifact_prefix: &str,
    relative: &Path,
) -> Discovery {
    let mut discovery = Discovery::default();
    let caches = gradle_home.join("caches");
    if !caches.is_dir() {
        return discovery;
    }

    for root in transform_roots(&caches, &mut discovery.warnings) {
        // <root>/<hash>/transformed/<artifact>
        let walker = WalkDir::new(&root)
            .max_depth(3)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() != 2 || entry.file_name() == "transformed");

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    discovery.warnings.push(error.into());
                    continue;
                }
            };
            if entry.depth() != 3 || !entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !name.starts_with(artifact_prefix) {
                continue;
            }

            let file = entry.path().join(relative);
            if file.is_file() {
                discovery.targets.push(Target {
                    id: id.to_string(),
                    file,
                    version: artifact_version(&name, artifact_prefix),
                });
            }
        }
    }

    discovery
}

fn transform_roots(caches: &Path, warnings: &mut Vec<DiscoveryError>) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    for entry in WalkDir::new(caches)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warnings.push(error.into());
                continue;
            }
        };
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with("transforms-") {
            roots.push(entry.path().to_path_buf());
        } else {
            let nested = entry.path().join("transforms");
            if nested.is_dir() {
                roots.push(nested);
            }
        }
    }
    roots
}
