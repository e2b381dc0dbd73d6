//! Version-control backends behind a single capability interface.
//!
//! Two systems are supported: Mercurial (`hg`) and Git (`git`).  The engine
//! never talks to either tool directly; it goes through [`Backend`] and picks
//! implementations out of an ordered [`Backends`] registry built once per
//! run.
pub mod git;
pub mod ignore;
pub mod mercurial;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, Result};

use crate::exec::Executor;

pub use git::Git;
pub use mercurial::Mercurial;

/// A supported version-control system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VcsKind {
    /// Mercurial.
    Mercurial,
    /// Git.
    Git,
}

impl VcsKind {
    /// Every supported kind, in detection priority order.
    pub const ALL: [Self; 2] = [Self::Mercurial, Self::Git];

    /// Manifest token (`hg` or `git`).
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::Mercurial => "hg",
            Self::Git => "git",
        }
    }

    /// Directory that marks a checkout root.
    #[must_use]
    pub const fn marker(self) -> &'static str {
        match self {
            Self::Mercurial => ".hg",
            Self::Git => ".git",
        }
    }

    /// Parse a manifest token.
    ///
    /// # Examples
    ///
    /// ```
    /// use ensure_deps_cli::vcs::VcsKind;
    ///
    /// assert_eq!(VcsKind::from_token("git"), Some(VcsKind::Git));
    /// assert_eq!(VcsKind::from_token("svn"), None);
    /// ```
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.token() == token)
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Operations the resolution engine needs from a version-control system.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Which system this backend drives.
    fn kind(&self) -> VcsKind;

    /// Whether `dir` is a checkout root for this backend.
    fn detect(&self, dir: &Path) -> bool {
        dir.join(self.kind().marker()).exists()
    }

    /// Create a checkout of `source` at `target`, quietly and without
    /// prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the clone command fails.
    fn clone_repo(&self, source: &str, target: &Path) -> Result<()>;

    /// Resolve `reference` (or the checked-out revision when `None`) to the
    /// backend's canonical revision id.
    ///
    /// An unknown reference yields an empty string, never an error.
    ///
    /// # Errors
    ///
    /// Returns an error only if the tool cannot be executed.
    fn revision_id(&self, repo: &Path, reference: Option<&str>) -> Result<String>;

    /// Fetch remote history into `repo` without touching the working tree.
    ///
    /// # Errors
    ///
    /// Returns an error if any fetch command fails.
    fn pull(&self, repo: &Path) -> Result<()>;

    /// Switch the working tree of `repo` to `id`.
    ///
    /// Must refuse, and fail, when local modifications would be lost.
    ///
    /// # Errors
    ///
    /// Returns an error if the checkout command fails.
    fn checkout(&self, repo: &Path, id: &str, reference: &str) -> Result<()>;

    /// Make `parent` ignore the nested checkout at `child`.
    ///
    /// Repeated calls for the same child leave a single rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the ignore configuration cannot be written.
    fn ignore(&self, child: &Path, parent: &Path) -> Result<()>;

    /// Canonicalize a source URL for this backend.
    fn normalize_url(&self, url: &str) -> String {
        url.to_string()
    }
}

/// Ordered set of available backends.
///
/// Order is detection priority: the first backend whose [`Backend::detect`]
/// accepts a directory determines that directory's kind.
#[derive(Debug)]
pub struct Backends {
    backends: Vec<Box<dyn Backend>>,
}

impl Backends {
    /// Build a registry from explicit backends, keeping their order.
    #[must_use]
    pub fn new(backends: Vec<Box<dyn Backend>>) -> Self {
        Self { backends }
    }

    /// The production registry: Mercurial, then Git, both running real
    /// commands through `executor`.
    #[must_use]
    pub fn system(executor: &Arc<dyn Executor>) -> Self {
        Self::new(vec![
            Box::new(Mercurial::new(Arc::clone(executor))),
            Box::new(Git::new(Arc::clone(executor))),
        ])
    }

    /// Kind of checkout rooted at `dir`, or `None` for a plain directory.
    #[must_use]
    pub fn detect(&self, dir: &Path) -> Option<VcsKind> {
        self.backends
            .iter()
            .find(|b| b.detect(dir))
            .map(|b| b.kind())
    }

    /// Backend for `kind`, if registered.
    #[must_use]
    pub fn get(&self, kind: VcsKind) -> Option<&dyn Backend> {
        self.backends
            .iter()
            .find(|b| b.kind() == kind)
            .map(AsRef::as_ref)
    }

    /// Registered kinds in priority order.
    pub fn kinds(&self) -> impl Iterator<Item = VcsKind> + '_ {
        self.backends.iter().map(|b| b.kind())
    }
}

/// Clone into a staging directory next to `target` and move it into place.
///
/// `target` only appears once `clone` has fully succeeded, so an interrupted
/// clone never looks like a finished checkout.  A stale staging directory
/// from an earlier interrupted run is removed first.
///
/// # Errors
///
/// Returns an error if the staging area cannot be prepared, `clone` fails,
/// or the final rename fails.
pub fn clone_via_staging(target: &Path, clone: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    let parent = target
        .parent()
        .with_context(|| format!("{} has no parent directory", target.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("creating {}", parent.display()))?;

    let name = target
        .file_name()
        .with_context(|| format!("{} has no file name", target.display()))?;
    let mut staging_name = std::ffi::OsString::from(".");
    staging_name.push(name);
    staging_name.push(".partial");
    let staging = parent.join(staging_name);

    if staging.exists() {
        std::fs::remove_dir_all(&staging)
            .with_context(|| format!("removing stale {}", staging.display()))?;
    }

    clone(&staging)?;

    std::fs::rename(&staging, target).with_context(|| {
        format!(
            "moving {} into place at {}",
            staging.display(),
            target.display()
        )
    })
}

/// Path of `child` relative to `parent`, `/`-separated.
///
/// # Errors
///
/// Returns an error if `child` is not inside `parent`.
pub fn relative_path(child: &Path, parent: &Path) -> Result<String> {
    let rel = child.strip_prefix(parent).with_context(|| {
        format!("{} is not inside {}", child.display(), parent.display())
    })?;
    Ok(rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/"))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::exec::test_helpers::MockExecutor;

    fn registry() -> Backends {
        let executor: Arc<dyn Executor> = Arc::new(MockExecutor::default());
        Backends::system(&executor)
    }

    #[test]
    fn token_round_trip() {
        for kind in VcsKind::ALL {
            assert_eq!(VcsKind::from_token(kind.token()), Some(kind));
        }
    }

    #[test]
    fn detect_plain_directory_is_untyped() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(registry().detect(dir.path()), None);
    }

    #[test]
    fn detect_prefers_mercurial() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        assert_eq!(registry().detect(dir.path()), Some(VcsKind::Git));
        std::fs::create_dir(dir.path().join(".hg")).unwrap();
        assert_eq!(registry().detect(dir.path()), Some(VcsKind::Mercurial));
    }

    #[test]
    fn system_registry_order() {
        let kinds: Vec<VcsKind> = registry().kinds().collect();
        assert_eq!(kinds, vec![VcsKind::Mercurial, VcsKind::Git]);
    }

    #[test]
    fn staging_clone_moves_result_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("deps").join("core");
        clone_via_staging(&target, |staging| {
            std::fs::create_dir_all(staging.join(".git"))?;
            Ok(())
        })
        .unwrap();
        assert!(target.join(".git").is_dir());
        assert!(!dir.path().join("deps").join(".core.partial").exists());
    }

    #[test]
    fn failed_clone_leaves_no_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("core");
        let result = clone_via_staging(&target, |staging| {
            std::fs::create_dir_all(staging.join(".hg"))?;
            anyhow::bail!("network unreachable")
        });
        assert!(result.is_err());
        assert!(!target.exists(), "target must not exist after a failed clone");
    }

    #[test]
    fn stale_staging_directory_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join(".core.partial");
        std::fs::create_dir_all(stale.join("junk")).unwrap();
        let target = dir.path().join("core");
        clone_via_staging(&target, |staging| {
            assert!(!staging.exists(), "stale staging dir should be removed");
            std::fs::create_dir_all(staging)?;
            Ok(())
        })
        .unwrap();
        assert!(!target.join("junk").exists());
    }

    #[test]
    fn relative_path_uses_forward_slashes() {
        let parent = Path::new("/repo");
        let child = parent.join("a").join("b");
        assert_eq!(relative_path(&child, parent).unwrap(), "a/b");
        assert!(relative_path(Path::new("/elsewhere"), parent).is_err());
    }
}
