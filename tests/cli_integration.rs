//! CLI integration tests for nativepack.
//!
//! None of these reach vcpkg or NuGet: they stop at planning or at the
//! checks that run before the first target.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const PARAMETER_VARS: &[&str] = &[
    "NATIVEPACK_ROOT",
    "NATIVEPACK_PACKAGE_NAME",
    "NATIVEPACK_PACKAGE_VERSION",
    "NATIVEPACK_PACKAGE_ID",
    "NATIVEPACK_AUTHORS",
    "NATIVEPACK_LICENSE",
    "NATIVEPACK_PROJECT_URL",
    "NATIVEPACK_REPOSITORY_URL",
    "NATIVEPACK_DESCRIPTION",
    "NATIVEPACK_FEATURES",
    "NATIVEPACK_DEFAULT_FEATURES",
    "NATIVEPACK_TRIPLETS",
    "NATIVEPACK_BINARY_SOURCES",
    "NATIVEPACK_OVERLAY_PORTS",
    "NATIVEPACK_OVERLAY_TRIPLETS",
    "NATIVEPACK_VCPKG_ROOT",
    "NATIVEPACK_MANIFEST_ROOT",
    "NATIVEPACK_PARALLEL",
    "NATIVEPACK_DEBUG",
    "NATIVEPACK_SYSTEM_PACKAGES",
    "NATIVEPACK_NUGET",
    "NATIVEPACK_API_KEY",
    "NATIVEPACK_FEED",
];

/// The nativepack binary, isolated from the caller's environment and
/// global config.
fn nativepack(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nativepack").unwrap();
    for var in PARAMETER_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG")
        .env("HOME", dir)
        .current_dir(dir)
        .args(["--color", "never"]);
    cmd
}

// ============================================================================
// nativepack list
// ============================================================================

#[test]
fn test_list_shows_listed_targets() {
    let tmp = TempDir::new().unwrap();

    nativepack(tmp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("clean"))
        .stdout(predicate::str::contains("build-port-package"))
        .stdout(predicate::str::contains("publish"))
        .stdout(predicate::str::contains("(default)"));
}

#[test]
fn test_list_hides_setup_targets() {
    let tmp = TempDir::new().unwrap();

    nativepack(tmp.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("setup-vcpkg").not())
        .stdout(predicate::str::contains("setup-build-dependencies").not());
}

// ============================================================================
// nativepack run --plan
// ============================================================================

#[test]
fn test_plan_default_target() {
    let tmp = TempDir::new().unwrap();

    let output = nativepack(tmp.path())
        .args(["run", "--plan"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let order: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.split_once(". ").map(|(_, name)| name.trim()))
        .collect();
    assert_eq!(
        order,
        vec![
            "setup-vcpkg",
            "setup-build-dependencies",
            "build-port-package",
            "archive-port-package",
            "extract-port-package",
            "build-runtime-package",
            "build-multiplatform-package",
        ]
    );
    assert!(!tmp.path().join("artifacts").exists());
}

#[test]
fn test_plan_runs_clean_first() {
    let tmp = TempDir::new().unwrap();

    nativepack(tmp.path())
        .args(["run", "build-port-package", "clean", "--plan"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("  1. clean"));
}

#[test]
fn test_unknown_target() {
    let tmp = TempDir::new().unwrap();

    nativepack(tmp.path())
        .args(["run", "deploy", "--plan"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown target `deploy`"))
        .stderr(predicate::str::contains("nativepack list"));
}

// ============================================================================
// nativepack run
// ============================================================================

#[test]
fn test_missing_parameters_fail_before_any_target() {
    let tmp = TempDir::new().unwrap();

    nativepack(tmp.path())
        .args([
            "run",
            "build-runtime-package",
            "--package-name",
            "zlib",
            "--triplets",
            "x64-linux-dynamic-release",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing required parameters"))
        .stderr(predicate::str::contains("package-version"))
        .stderr(predicate::str::contains("--authors"));

    assert!(!tmp.path().join("artifacts").exists());
}

#[test]
fn test_unsupported_triplet_fails() {
    let tmp = TempDir::new().unwrap();

    nativepack(tmp.path())
        .args([
            "run",
            "build-port-package",
            "--package-name",
            "zlib",
            "--package-version",
            "1.3.1",
            "--triplets",
            "x64-plan9",
        ])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("x64-plan9"))
        .stderr(predicate::str::contains("not supported"));

    assert!(!tmp.path().join("artifacts").exists());
}

#[test]
fn test_project_config_maps_triplet() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("nativepack.toml"),
        r#"
[package]
name = "zlib"

[triplets]
x64-plan9 = "plan9-x64"
"#,
    )
    .unwrap();

    // The mapping gets past triplet resolution; the missing metadata
    // then stops the run before anything executes.
    nativepack(tmp.path())
        .args(["run", "build-runtime-package", "--triplets", "x64-plan9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not supported").not())
        .stderr(predicate::str::contains("missing required parameters"));

    assert!(!tmp.path().join("artifacts").exists());
}

#[test]
fn test_project_config_runtime_must_stay_inside_artifacts() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("nativepack.toml"),
        r#"
[package]
name = "zlib"
version = "1.3.1"

[triplets]
x64-plan9 = "../../escape"
"#,
    )
    .unwrap();

    nativepack(tmp.path())
        .args(["run", "build-runtime-package", "--triplets", "x64-plan9"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid runtime identifier"));

    assert!(!tmp.path().join("artifacts").exists());
    assert!(!tmp.path().join("escape").exists());
}

// ============================================================================
// nativepack completions
// ============================================================================

#[test]
fn test_completions_bash() {
    let tmp = TempDir::new().unwrap();

    nativepack(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nativepack"));
}
