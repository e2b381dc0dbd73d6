#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Tests that run the `ensure-deps` binary itself.

mod common;

use std::path::Path;
use std::process::{Command, Output};

use common::write_manifest;

/// Run the binary with an isolated log directory and no inherited
/// configuration from the environment.
fn ensure_deps(cache: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ensure-deps"))
        .args(args)
        .env("XDG_CACHE_HOME", cache)
        .env_remove("SKIP_DEPENDENCY_UPDATES")
        .env_remove("ENSURE_DEPS_ROOT")
        .output()
        .expect("run ensure-deps")
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn version_flag_prints_version() {
    let cache = tempfile::tempdir().unwrap();
    let output = ensure_deps(cache.path(), &["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("ensure-deps "));
}

#[test]
fn repository_without_manifest_warns_and_succeeds() {
    let cache = tempfile::tempdir().unwrap();
    let repo = tempfile::tempdir().unwrap();
    let output = ensure_deps(cache.path(), &[repo.path().to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stderr(&output).contains("No dependencies file in directory"));
}

#[test]
fn empty_manifest_succeeds_quietly() {
    let cache = tempfile::tempdir().unwrap();
    let repo = tempfile::tempdir().unwrap();
    write_manifest(repo.path(), "# nothing yet\n");
    let output = ensure_deps(cache.path(), &["--quiet", repo.path().to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(output.stdout.is_empty());
}

#[test]
fn unsafe_dependency_path_fails() {
    let cache = tempfile::tempdir().unwrap();
    let repo = tempfile::tempdir().unwrap();
    write_manifest(repo.path(), "../outside = outside 1.0\n");
    let output = ensure_deps(cache.path(), &[repo.path().to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("has to be inside the repository"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn malformed_root_override_fails() {
    let cache = tempfile::tempdir().unwrap();
    let repo = tempfile::tempdir().unwrap();
    let output = ensure_deps(
        cache.path(),
        &["--root", "https://example.org/", repo.path().to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("expected TYPE:URL"));
}

#[test]
fn dry_run_reports_the_clone_without_touching_disk() {
    let cache = tempfile::tempdir().unwrap();
    let repo = tempfile::tempdir().unwrap();
    write_manifest(
        repo.path(),
        "_root = git:https://git.example.org/\nlib = lib v1\n",
    );
    let output = ensure_deps(
        cache.path(),
        &["--dry-run", "--no-self-update", repo.path().to_str().unwrap()],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!repo.path().join("lib").exists());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("would clone"), "{stdout}");
}

#[test]
fn skip_updates_environment_acts_as_dry_run() {
    let cache = tempfile::tempdir().unwrap();
    let repo = tempfile::tempdir().unwrap();
    write_manifest(repo.path(), "lib = lib git:v1\n");
    let output = Command::new(env!("CARGO_BIN_EXE_ensure-deps"))
        .arg(repo.path())
        .env("XDG_CACHE_HOME", cache.path())
        .env("SKIP_DEPENDENCY_UPDATES", "1")
        .output()
        .expect("run ensure-deps");
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!repo.path().join("lib").exists());
}
