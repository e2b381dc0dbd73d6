//! Git backend driven through the `git` command line.
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use super::{Backend, VcsKind, ignore, relative_path};
use crate::engine::url::scheme_of;
use crate::exec::Executor;

/// Environment passed to commands that may contact a remote.
const NON_INTERACTIVE: &[(&str, &str)] = &[("GIT_TERMINAL_PROMPT", "0")];

/// Git backend.
#[derive(Debug)]
pub struct Git {
    executor: Arc<dyn Executor>,
}

impl Git {
    /// Create a backend that runs `git` through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }

    /// Create local tracking branches for every `origin/*` branch that
    /// has none yet.  Returns whether any branch was added.
    fn track_remote_branches(&self, repo: &Path) -> Result<bool> {
        let remotes = self.executor.run_in(repo, "git", &["branch", "--remotes"])?;
        let mut newly_tracked = false;
        for (remote, local) in parse_remote_branches(&remotes.stdout) {
            // Fails harmlessly when the local branch already exists.
            let result = self
                .executor
                .run_in_unchecked(repo, "git", &["branch", "--track", local, remote])?;
            newly_tracked |= result.success;
        }
        Ok(newly_tracked)
    }
}

/// `(remote, local)` branch pairs from `git branch --remotes` output.
///
/// Symbolic lines such as `origin/HEAD -> origin/main` are skipped.
fn parse_remote_branches(output: &str) -> Vec<(&str, &str)> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.contains(char::is_whitespace))
        .filter_map(|remote| {
            let local = remote.strip_prefix("origin/")?;
            (!local.is_empty()).then_some((remote, local))
        })
        .collect()
}

impl Backend for Git {
    fn kind(&self) -> VcsKind {
        VcsKind::Git
    }

    fn clone_repo(&self, source: &str, target: &Path) -> Result<()> {
        let mut source = source.trim_end_matches('/').to_string();
        if !source.ends_with(".git") {
            source.push_str(".git");
        }
        let cwd = target.parent().unwrap_or(target);
        let target = target.to_string_lossy();
        self.executor.run_in_with_env(
            cwd,
            "git",
            &["clone", "--quiet", "--", &source, &target],
            NON_INTERACTIVE,
        )?;
        Ok(())
    }

    fn revision_id(&self, repo: &Path, reference: Option<&str>) -> Result<String> {
        let spec = format!("{}^{{commit}}", reference.unwrap_or("HEAD"));
        let result = self
            .executor
            .run_in_unchecked(repo, "git", &["rev-parse", "--revs-only", &spec])?;
        if !result.success {
            return Ok(String::new());
        }
        Ok(result.stdout.trim().to_string())
    }

    fn pull(&self, repo: &Path) -> Result<()> {
        self.executor.run_in_with_env(
            repo,
            "git",
            &["fetch", "--quiet", "--all", "--tags"],
            NON_INTERACTIVE,
        )?;
        if self.track_remote_branches(repo)? {
            self.executor.run_in_with_env(
                repo,
                "git",
                &["fetch", "--quiet", "origin"],
                NON_INTERACTIVE,
            )?;
        }
        Ok(())
    }

    fn checkout(&self, repo: &Path, id: &str, reference: &str) -> Result<()> {
        // Checking out the reference keeps branches attached.
        let target = if reference.starts_with('-') { id } else { reference };
        self.executor
            .run_in(repo, "git", &["checkout", "--quiet", target])?;
        Ok(())
    }

    fn ignore(&self, child: &Path, parent: &Path) -> Result<()> {
        let exclude = parent.join(".git").join("info").join("exclude");
        let rule = format!("/{}", relative_path(child, parent)?);
        ignore::ensure_line(&exclude, &rule)?;
        Ok(())
    }

    /// Rewrite scp-like `user@host:path` into `ssh://user@host/path`.
    fn normalize_url(&self, url: &str) -> String {
        if url.contains('@') && url.contains(':') && scheme_of(url).is_none() {
            return format!("ssh://{}", url.replacen(':', "/", 1));
        }
        url.to_string()
    }
}
