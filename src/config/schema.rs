use crate::edit::TextPatch;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct PatchConfig {
    #[serde(default)]
    pub meta: Metadata,
    pub rule: Rule,
    #[serde(default)]
    pub include: Option<Include>,
    #[serde(default)]
    pub diagnostics: Diagnostics,
    #[serde(default)]
    pub targets: Vec<TargetDefinition>,
}

impl PatchConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        let search = self.rule.search.as_str();
        let replace = self.rule.replace.as_str();
        if search.is_empty() {
            issues.push(ValidationIssue::MissingField {
                target_id: None,
                field: "rule.search",
            });
        }
        if replace.is_empty() {
            issues.push(ValidationIssue::MissingField {
                target_id: None,
                field: "rule.replace",
            });
        }
        if !search.is_empty() && !replace.is_empty() {
            if search == replace {
                issues.push(ValidationIssue::InvalidCombo {
                    target_id: None,
                    message: "rule.search and rule.replace are identical".to_string(),
                });
            } else if replace.contains(search) {
                issues.push(ValidationIssue::InvalidCombo {
                    target_id: None,
                    message: format!(
                        "rule.replace '{replace}' contains rule.search '{search}' \
                         and could never verify"
                    ),
                });
            }
        }

        if let Some(include) = &self.include {
            if include.marker.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    target_id: None,
                    field: "include.marker",
                });
            }
            if include.anchor.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    target_id: None,
                    field: "include.anchor",
                });
            }
            if !include.marker.is_empty() && include.marker == include.anchor {
                issues.push(ValidationIssue::InvalidCombo {
                    target_id: None,
                    message: "include.marker and include.anchor are identical".to_string(),
                });
            }
        }

        if self.diagnostics.window_start == 0 || self.diagnostics.window_len == 0 {
            issues.push(ValidationIssue::InvalidCombo {
                target_id: None,
                message: "diagnostics window_start and window_len must be at least 1".to_string(),
            });
        }

        if self.targets.is_empty() {
            issues.push(ValidationIssue::EmptyTargetList);
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            let id = target.id.trim();
            if id.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    target_id: None,
                    field: "id",
                });
            } else if !seen.insert(id) {
                issues.push(ValidationIssue::DuplicateTarget { id: id.to_string() });
            }

            let path = match &target.location {
                Location::NodeModules { path } => path,
                Location::GradleCache {
                    artifact_prefix,
                    path,
                } => {
                    if artifact_prefix.trim().is_empty() {
                        issues.push(ValidationIssue::MissingField {
                            target_id: Some(target.id.clone()),
                            field: "artifact_prefix",
                        });
                    }
                    path
                }
            };
            if path.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    target_id: Some(target.id.clone()),
                    field: "path",
                });
            } else if Path::new(path).is_absolute() {
                // Joining an absolute path would discard the project or cache root
                issues.push(ValidationIssue::InvalidCombo {
                    target_id: Some(target.id.clone()),
                    message: format!("path '{path}' must be relative"),
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// The in-memory patch described by `[rule]` and `[include]`.
    pub fn text_patch(&self) -> TextPatch {
        let patch = TextPatch::new(&self.rule.search, &self.rule.replace);
        match &self.include {
            Some(include) => patch.with_include(&include.marker, &include.anchor),
            None => patch,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Metadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// semver requirement on the React Native version of each target
    #[serde(default)]
    pub version_range: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Rule {
    pub search: String,
    pub replace: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Include {
    pub marker: String,
    pub anchor: String,
}

/// Controls the excerpt printed when a file matches neither literal.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    /// Lines containing this keyword are previewed
    #[serde(default = "default_keyword")]
    pub keyword: String,
    /// First line (1-based) of the fallback window
    #[serde(default = "default_window_start")]
    pub window_start: usize,
    #[serde(default = "default_window_len")]
    pub window_len: usize,
}

fn default_keyword() -> String {
    "format".to_string()
}

fn default_window_start() -> usize {
    76
}

fn default_window_len() -> usize {
    10
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            keyword: default_keyword(),
            window_start: default_window_start(),
            window_len: default_window_len(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TargetDefinition {
    pub id: String,
    #[serde(flatten)]
    pub location: Location,
}

/// Where copies of the patched file live.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Location {
    /// A path relative to the project root
    NodeModules { path: String },
    /// A path inside every matching Gradle transform output
    GradleCache {
        artifact_prefix: String,
        path: String,
    },
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyTargetList,
    DuplicateTarget {
        id: String,
    },
    MissingField {
        target_id: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        target_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyTargetList => write!(f, "patch config contains no targets"),
            ValidationIssue::DuplicateTarget { id } => {
                write!(f, "target id '{id}' is defined more than once")
            }
            ValidationIssue::MissingField { target_id, field } => match target_id {
                Some(id) => write!(f, "target '{id}' missing required field '{field}'"),
                None => write!(f, "missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { target_id, message } => match target_id {
                Some(id) => write!(f, "target '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid patch configuration: {message}"),
            },
        }
    }
}
