pub mod applicator;
pub mod loader;
pub mod schema;
pub mod version;

pub use applicator::{
    apply_patches, check_patches, inspect_file, patch_file, version_skip_reason, InspectResult,
    PatchError, PatchOptions, PatchReport, PatchResult, TargetStatus, Verdict,
};
pub use loader::{load_builtin, load_from_path, load_from_str, ConfigError, BUILTIN_CONFIG};
pub use schema::{
    Diagnostics, Include, Location, Metadata, PatchConfig, Rule, TargetDefinition,
    ValidationError, ValidationIssue,
};
pub use version::{artifact_version, matches_requirement, VersionError};
