// Shared helpers for integration tests.
//
// Provides scratch repositories built with the real `git` and `hg` tools and
// a small wrapper that runs the resolution engine against them with an
// in-memory log.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use ensure_deps_cli::config::manifest::FILE_NAME;
use ensure_deps_cli::config::spec::SourceKey;
use ensure_deps_cli::engine::{self, Context, Resolution};
use ensure_deps_cli::exec::{self, Executor, SystemExecutor};
use ensure_deps_cli::logging::MemoryLog;
use ensure_deps_cli::vcs::Backends;

/// Whether `program` can be run; tests needing it return early otherwise.
pub fn has_tool(program: &str) -> bool {
    exec::which(program)
}

/// Run `program` in `dir`, panicking with its stderr on failure.
pub fn run(dir: &Path, program: &str, args: &[&str]) -> String {
    let output = Command::new(program)
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test")
        .env("GIT_AUTHOR_EMAIL", "test@example.org")
        .env("GIT_COMMITTER_NAME", "Test")
        .env("GIT_COMMITTER_EMAIL", "test@example.org")
        .env("HGUSER", "Test <test@example.org>")
        .env("HGPLAIN", "1")
        .output()
        .expect("spawn tool");
    assert!(
        output.status.success(),
        "{program} {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create a Git repository at `dir` with one commit holding `file`.
pub fn git_repo(dir: &Path, file: &str, content: &str) {
    std::fs::create_dir_all(dir).expect("create repo dir");
    run(dir, "git", &["-c", "init.defaultBranch=main", "init", "--quiet"]);
    git_commit(dir, file, content, "initial");
}

/// Commit `content` to `file` in the Git repository at `dir`.
pub fn git_commit(dir: &Path, file: &str, content: &str, message: &str) {
    std::fs::write(dir.join(file), content).expect("write file");
    run(dir, "git", &["add", file]);
    run(dir, "git", &["commit", "--quiet", "-m", message]);
}

/// Create a Mercurial repository at `dir` with one commit holding `file`.
pub fn hg_repo(dir: &Path, file: &str, content: &str) {
    std::fs::create_dir_all(dir).expect("create repo dir");
    run(dir, "hg", &["init"]);
    hg_commit(dir, file, content, "initial");
}

/// Commit `content` to `file` in the Mercurial repository at `dir`.
pub fn hg_commit(dir: &Path, file: &str, content: &str, message: &str) {
    std::fs::write(dir.join(file), content).expect("write file");
    run(dir, "hg", &["add", "--quiet", file]);
    run(dir, "hg", &["commit", "--quiet", "-m", message]);
}

/// Write `content` as the manifest of `dir`.
pub fn write_manifest(dir: &Path, content: &str) {
    std::fs::write(dir.join(FILE_NAME), content).expect("write manifest");
}

/// Scratch area holding remote repositories and a working repository.
pub struct Workspace {
    root: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Directory used as the backend root URL.
    pub fn remotes(&self) -> PathBuf {
        let dir = self.root.path().join("remotes");
        std::fs::create_dir_all(&dir).expect("create remotes dir");
        dir
    }

    /// The repository whose manifest is resolved.
    pub fn work(&self) -> PathBuf {
        self.root.path().join("work")
    }

    /// `remotes/` as a root value, with a trailing separator.
    pub fn root_value(&self) -> String {
        format!("{}/", self.remotes().display())
    }
}

/// Engine inputs for one run against real tools.
pub struct Harness {
    pub backends: Backends,
    pub log: MemoryLog,
    pub skip: BTreeSet<SourceKey>,
    pub skip_mutations: bool,
}

impl Harness {
    pub fn new() -> Self {
        let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
        Self {
            backends: Backends::system(&executor),
            log: MemoryLog::new(),
            skip: BTreeSet::new(),
            skip_mutations: false,
        }
    }

    pub fn resolve(&self, dir: &Path) -> anyhow::Result<Resolution> {
        let ctx = Context {
            backends: &self.backends,
            log: &self.log,
            skip_mutations: self.skip_mutations,
            root_overrides: None,
            skip: &self.skip,
        };
        engine::resolve(&ctx, dir, false)
    }
}
