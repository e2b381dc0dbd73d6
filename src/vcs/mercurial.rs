//! Mercurial backend driven through the `hg` command line.
use anyhow::{Context as _, Result};
use std::path::Path;
use std::sync::Arc;

use super::{Backend, VcsKind, ignore, relative_path};
use crate::config::ini;
use crate::exec::Executor;

/// Config section and key pointing Mercurial at the shared ignore file.
const IGNORE_SECTION: &str = "ui";
const IGNORE_KEY: &str = "ignore.dependencies";

/// Mercurial backend.
#[derive(Debug)]
pub struct Mercurial {
    executor: Arc<dyn Executor>,
}

impl Mercurial {
    /// Create a backend that runs `hg` through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

impl Backend for Mercurial {
    fn kind(&self) -> VcsKind {
        VcsKind::Mercurial
    }

    fn clone_repo(&self, source: &str, target: &Path) -> Result<()> {
        let mut source = source.to_string();
        if !source.ends_with('/') {
            source.push('/');
        }
        let cwd = target.parent().unwrap_or(target);
        let target = target.to_string_lossy();
        self.executor.run_in(
            cwd,
            "hg",
            &[
                "clone",
                "--quiet",
                "--noninteractive",
                "--noupdate",
                "--",
                &source,
                &target,
            ],
        )?;
        Ok(())
    }

    fn revision_id(&self, repo: &Path, reference: Option<&str>) -> Result<String> {
        let repo_arg = repo.to_string_lossy();
        let mut args: Vec<&str> = vec!["id", "--repository", &repo_arg, "--id"];
        if let Some(rev) = reference {
            args.extend(["--rev", rev]);
        }
        // hg exits non-zero for an unknown revision; that is an empty id.
        let result = self.executor.run_in_unchecked(repo, "hg", &args)?;
        Ok(result.stdout.trim().to_string())
    }

    fn pull(&self, repo: &Path) -> Result<()> {
        let repo_arg = repo.to_string_lossy();
        self.executor.run_in(
            repo,
            "hg",
            &[
                "pull",
                "--repository",
                &repo_arg,
                "--quiet",
                "--noninteractive",
            ],
        )?;
        Ok(())
    }

    fn checkout(&self, repo: &Path, id: &str, _reference: &str) -> Result<()> {
        let repo_arg = repo.to_string_lossy();
        self.executor.run_in(
            repo,
            "hg",
            &[
                "update",
                "--repository",
                &repo_arg,
                "--quiet",
                "--noninteractive",
                "--check",
                "--rev",
                id,
            ],
        )?;
        Ok(())
    }

    fn ignore(&self, child: &Path, parent: &Path) -> Result<()> {
        // A nested Mercurial checkout is already skipped by hg itself.
        if self.detect(child) {
            return Ok(());
        }

        let hg_dir = std::path::absolute(parent.join(".hg"))
            .with_context(|| format!("resolving {}", parent.display()))?;
        let ignore_file = hg_dir.join("dependencies");
        let config_path = hg_dir.join("hgrc");

        let current = match std::fs::read_to_string(&config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                return Err(
                    anyhow::Error::new(e).context(format!("reading {}", config_path.display()))
                );
            }
        };
        let value = ignore_file.to_string_lossy();
        if ini::get_value(&current, IGNORE_SECTION, IGNORE_KEY).as_deref() != Some(&*value) {
            let updated = ini::set_value(&current, IGNORE_SECTION, IGNORE_KEY, &value);
            std::fs::write(&config_path, updated)
                .with_context(|| format!("writing {}", config_path.display()))?;
        }

        ignore::ensure_line(&ignore_file, &relative_path(child, parent)?)?;
        Ok(())
    }
}
