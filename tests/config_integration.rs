//! Integration tests for patch set loading, validation and target application

use sformat_patcher::config::{
    apply_patches, check_patches, load_from_path, load_from_str, ConfigError, InspectResult,
    Location, PatchOptions, PatchResult, ValidationIssue, Verdict,
};
use sformat_patcher::locate::{resolve_targets, DiscoveryContext, Target};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const NODE_HEADER: &str =
    "node_modules/react-native/ReactCommon/react/renderer/core/graphicsConversions.h";
const PREFAB_HEADER: &str =
    "prefab/modules/reactnative/include/react/renderer/core/graphicsConversions.h";

const UNPATCHED: &str = r#"#pragma once

#include <folly/dynamic.h>
#include <react/renderer/graphics/Color.h>

namespace facebook::react {

inline std::string toString(const SharedColor& value) {
  return std::format("rgba({}, {}, {}, {})", r, g, b, a);
}

} // namespace facebook::react
"#;

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Helper to create a project + Gradle home with unpatched headers
fn setup_project(rn_version: &str) -> (TempDir, TempDir) {
    let project = TempDir::new().unwrap();
    write_file(&project.path().join(NODE_HEADER), UNPATCHED);
    write_file(
        &project.path().join("node_modules/react-native/package.json"),
        &format!(r#"{{ "name": "react-native", "version": "{rn_version}" }}"#),
    );

    let gradle = TempDir::new().unwrap();
    let artifact = format!("react-android-{rn_version}-debug");
    write_file(
        &gradle
            .path()
            .join("caches/8.14.3/transforms/8bca444e06763d64/transformed")
            .join(artifact)
            .join(PREFAB_HEADER),
        UNPATCHED,
    );

    (project, gradle)
}

#[test]
fn test_load_custom_patch_set() {
    let toml = r#"
[meta]
name = "fmt-to-sformat"
version_range = ">=0.80.0"

[rule]
search = "fmt::format"
replace = "folly::sformat"

[[targets]]
id = "vendored"
type = "node-modules"
path = "vendor/format.h"
"#;

    let config = load_from_str(toml).expect("Failed to parse config");

    assert_eq!(config.meta.name, "fmt-to-sformat");
    assert_eq!(config.meta.version_range.as_deref(), Some(">=0.80.0"));
    assert!(config.include.is_none());
    assert_eq!(config.diagnostics.keyword, "format");
    assert_eq!(config.diagnostics.window_start, 76);
    assert_eq!(
        config.targets[0].location,
        Location::NodeModules {
            path: "vendor/format.h".to_string()
        }
    );

    let patch = config.text_patch();
    assert_eq!(patch.rule.search, "fmt::format");
    assert!(patch.include.is_none());
}

#[test]
fn test_validation_collects_all_issues() {
    let toml = r##"
[rule]
search = "std::format"
replace = "std::format"

[include]
marker = ""
anchor = "#include <folly/dynamic.h>"

[diagnostics]
window_len = 0

[[targets]]
id = "a"
type = "node-modules"
path = ""

[[targets]]
id = "a"
type = "gradle-cache"
artifact_prefix = ""
path = "x.h"
"##;

    let source = match load_from_str(toml) {
        Err(ConfigError::Validation { source, .. }) => source,
        other => panic!("expected validation error, got {:?}", other.map(|_| ())),
    };

    let issues = &source.issues;
    assert!(issues.contains(&ValidationIssue::DuplicateTarget { id: "a".to_string() }));
    assert!(issues.contains(&ValidationIssue::MissingField {
        target_id: None,
        field: "include.marker",
    }));
    assert!(issues.contains(&ValidationIssue::MissingField {
        target_id: Some("a".to_string()),
        field: "path",
    }));
    assert!(issues.contains(&ValidationIssue::MissingField {
        target_id: Some("a".to_string()),
        field: "artifact_prefix",
    }));
    assert_eq!(
        issues
            .iter()
            .filter(|i| matches!(i, ValidationIssue::InvalidCombo { .. }))
            .count(),
        2
    );
    assert!(source.to_string().lines().count() >= 6);
}

#[test]
fn test_absolute_target_path_is_rejected() {
    let toml = r#"
[rule]
search = "std::format"
replace = "folly::sformat"

[[targets]]
id = "pinned"
type = "node-modules"
path = "/opt/react-native/graphicsConversions.h"
"#;

    let err = load_from_str(toml).unwrap_err();
    let source = match &err {
        ConfigError::Validation { source, .. } => source,
        other => panic!("expected validation error, got {other}"),
    };
    assert_eq!(
        source.issues,
        vec![ValidationIssue::InvalidCombo {
            target_id: Some("pinned".to_string()),
            message: "path '/opt/react-native/graphicsConversions.h' must be relative".to_string(),
        }]
    );
    assert!(err.to_string().contains("target 'pinned' has invalid configuration"));
}

#[test]
fn test_unknown_target_type_is_rejected() {
    let toml = r#"
[rule]
search = "std::format"
replace = "folly::sformat"

[[targets]]
id = "pods"
type = "cocoapods"
path = "Pods/x.h"
"#;

    assert!(matches!(
        load_from_str(toml),
        Err(ConfigError::Toml { .. })
    ));
}

#[test]
fn test_apply_builtin_patch_set_to_all_copies() {
    let (project, gradle) = setup_project("0.81.5");
    let config = load_from_path(
        Path::new(env!("CARGO_MANIFEST_DIR")).join("patches/folly-sformat.toml"),
    )
    .unwrap();
    let ctx = DiscoveryContext::new(project.path())
        .with_gradle_home(Some(gradle.path().to_path_buf()));

    let targets = resolve_targets(&config, &ctx).targets;
    assert_eq!(targets.len(), 2);
    assert!(targets
        .iter()
        .all(|t| t.version.as_deref() == Some("0.81.5")));

    let results = apply_patches(&config, &targets, PatchOptions::default());
    for (target, result) in &results {
        match result {
            Ok(PatchResult::Processed(report)) => {
                assert_eq!(report.verdict, Verdict::Success, "{}", target.file.display());
            }
            other => panic!("unexpected result for {}: {:?}", target.file.display(), other),
        }
        let content = fs::read_to_string(&target.file).unwrap();
        assert!(content.contains("return folly::sformat(\"rgba({}, {}, {}, {})\""));
        assert!(content.contains("#include <folly/dynamic.h>\n#include <folly/Format.h>\n"));
    }

    // Read-only check now reports every copy clean
    for (_, result) in check_patches(&config, &targets) {
        match result {
            Ok(InspectResult::Inspected(status)) => {
                assert!(status.is_clean());
                assert_eq!(status.verification.marker_present, Some(true));
            }
            other => panic!("unexpected inspect result: {:?}", other),
        }
    }
}

#[test]
fn test_version_range_skips_other_react_native_versions() {
    let (project, gradle) = setup_project("0.74.1");
    let mut config = sformat_patcher::load_builtin().unwrap();
    config.meta.version_range = Some(">=0.81.0".to_string());

    let ctx = DiscoveryContext::new(project.path())
        .with_gradle_home(Some(gradle.path().to_path_buf()));
    let targets = resolve_targets(&config, &ctx).targets;

    let results = apply_patches(&config, &targets, PatchOptions::default());
    assert_eq!(results.len(), 2);
    for (target, result) in results {
        assert!(matches!(result, Ok(PatchResult::SkippedVersion { .. })));
        assert_eq!(fs::read_to_string(&target.file).unwrap(), UNPATCHED);
    }
}

#[test]
fn test_missing_node_modules_copy_is_not_found() {
    let project = TempDir::new().unwrap();
    let config = sformat_patcher::load_builtin().unwrap();
    let ctx = DiscoveryContext::new(project.path()).with_gradle_home(None);

    let targets = resolve_targets(&config, &ctx).targets;
    let results = apply_patches(&config, &targets, PatchOptions::default());

    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0].1,
        Err(sformat_patcher::PatchError::NotFound { .. })
    ));
    assert!(!project.path().join("node_modules").exists());
}

#[test]
fn test_explicit_targets_ignore_version_range() {
    let project = TempDir::new().unwrap();
    let file = project.path().join("graphicsConversions.h");
    write_file(&file, UNPATCHED);

    let mut config = sformat_patcher::load_builtin().unwrap();
    config.meta.version_range = Some("=99.0.0".to_string());

    let results = apply_patches(&config, &[Target::explicit(&file)], PatchOptions::default());
    assert!(matches!(results[0].1, Ok(PatchResult::Processed(_))));
}
