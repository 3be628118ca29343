//! Integration tests for the CLI
//!
//! Tests the apply, verify and targets commands against a mock project

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const NODE_HEADER: &str =
    "node_modules/react-native/ReactCommon/react/renderer/core/graphicsConversions.h";

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Helper to create a React Native project with an unpatched header
fn setup_test_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_file(
        &dir.path().join(NODE_HEADER),
        "#include <folly/dynamic.h>\nauto s = std::format(\"{}\", x);\n",
    );
    write_file(
        &dir.path().join("node_modules/react-native/package.json"),
        r#"{ "name": "react-native", "version": "0.81.5" }"#,
    );
    dir
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sformat-patcher"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

#[test]
fn test_apply_help() {
    let output = run(&["apply", "--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Patch every target file and verify the result"));
}

#[test]
fn test_apply_patches_project() {
    let project = setup_test_project();
    let path = project.path().to_str().unwrap();

    let output = run(&["apply", "--project", path, "--no-gradle"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("Project:"));
    assert!(stdout.contains("react-native 0.81.5"));
    assert!(stdout.contains("Found std::format (1 occurrence)"));
    assert!(stdout.contains("Added #include <folly/Format.h>"));
    assert!(stdout.contains("SUCCESS"));
    assert!(stdout.contains("Summary:"));

    let content = fs::read_to_string(project.path().join(NODE_HEADER)).unwrap();
    assert!(content.contains("folly::sformat"));
    assert!(!content.contains("std::format"));
}

#[test]
fn test_apply_survives_broken_package_json() {
    let project = setup_test_project();
    fs::write(
        project.path().join("node_modules/react-native/package.json"),
        "{ not json",
    )
    .unwrap();

    let output = run(&[
        "apply",
        "--project",
        project.path().to_str().unwrap(),
        "--no-gradle",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "stderr: {stderr}");
    assert!(stderr.contains("Warning: failed to parse"));
    assert!(stdout.contains("SUCCESS"));
    let content = fs::read_to_string(project.path().join(NODE_HEADER)).unwrap();
    assert!(content.contains("folly::sformat"));
}

#[test]
fn test_apply_idempotent() {
    let project = setup_test_project();
    let path = project.path().to_str().unwrap();

    let _ = run(&["apply", "--project", path, "--no-gradle"]);
    let first = fs::read_to_string(project.path().join(NODE_HEADER)).unwrap();

    let output = run(&["apply", "--project", path, "--no-gradle"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Already patched"));
    assert!(stdout.contains("No changes needed."));
    assert_eq!(
        fs::read_to_string(project.path().join(NODE_HEADER)).unwrap(),
        first
    );
}

#[test]
fn test_apply_dry_run_does_not_modify() {
    let project = setup_test_project();
    let original = fs::read_to_string(project.path().join(NODE_HEADER)).unwrap();

    let output = run(&[
        "apply",
        "--project",
        project.path().to_str().unwrap(),
        "--no-gradle",
        "--dry-run",
        "--diff",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("+#include <folly/Format.h>"));
    assert_eq!(
        fs::read_to_string(project.path().join(NODE_HEADER)).unwrap(),
        original
    );
}

#[test]
fn test_apply_explicit_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("graphicsConversions.h");
    write_file(&file, "int unrelated = 0;\n");

    let output = run(&["apply", "--file", file.to_str().unwrap()]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    // Pattern absent is not a failure
    assert!(output.status.success());
    assert!(stdout.contains("Unknown state"));
    assert!(stdout.contains("UNKNOWN"));
    assert_eq!(fs::read_to_string(&file).unwrap(), "int unrelated = 0;\n");
}

#[test]
fn test_apply_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("graphicsConversions.h");

    let output = run(&["apply", "--file", file.to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("file does not exist"));
    assert!(!file.exists());
}

#[test]
fn test_verify_command() {
    let project = setup_test_project();
    let path = project.path().to_str().unwrap();

    // Unpatched: verify fails and shows the offending line
    let output = run(&["verify", "--project", path, "--no-gradle"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!output.status.success());
    assert!(stdout.contains("Verifying targets"));
    assert!(stdout.contains("2: auto s = std::format"));

    let _ = run(&["apply", "--project", path, "--no-gradle"]);

    let output = run(&["verify", "--project", path, "--no-gradle"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("CLEAN"));
    assert!(stdout.contains("Summary:"));
}

#[test]
fn test_targets_command_with_gradle_cache() {
    let project = setup_test_project();
    let gradle = TempDir::new().unwrap();
    write_file(
        &gradle
            .path()
            .join("caches/8.14.3/transforms/8bca444e/transformed/react-android-0.81.5-debug")
            .join("prefab/modules/reactnative/include/react/renderer/core/graphicsConversions.h"),
        "std::format(x);\n",
    );

    let output = run(&[
        "targets",
        "--project",
        project.path().to_str().unwrap(),
        "--gradle-home",
        gradle.path().to_str().unwrap(),
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("[node-modules, react-native 0.81.5]"));
    assert!(stdout.contains("[gradle-cache, react-native 0.81.5]"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[rule]\nsearch = \"\"\nreplace = \"x\"\n").unwrap();

    let output = run(&["apply", "--config", config.to_str().unwrap()]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("invalid patch config"));
}
