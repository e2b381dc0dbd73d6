//! Run configuration: manifest parsing plus the settings assembled from the
//! command line and environment.
pub mod ini;
pub mod manifest;
pub mod spec;

use anyhow::{Context as _, Result, bail};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use spec::{SourceKey, ValueSpec, split_token};

pub use manifest::Manifest;

/// Environment variable that disables clones and checkouts.
pub const SKIP_UPDATES_ENV: &str = "SKIP_DEPENDENCY_UPDATES";

/// Environment variable naming the default repository.
pub const ROOT_ENV: &str = "ENSURE_DEPS_ROOT";

/// Interpret the value of [`SKIP_UPDATES_ENV`].
///
/// Unset, empty, `0` and `false` (any case) leave mutations enabled.
///
/// # Examples
///
/// ```
/// use ensure_deps_cli::config::mutations_disabled;
///
/// assert!(!mutations_disabled(None));
/// assert!(!mutations_disabled(Some("FALSE")));
/// assert!(mutations_disabled(Some("1")));
/// ```
#[must_use]
pub fn mutations_disabled(value: Option<&str>) -> bool {
    value.is_some_and(|v| !matches!(v.to_ascii_lowercase().as_str(), "" | "0" | "false"))
}

/// Immutable settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Repositories to resolve, in order.
    pub repos: Vec<PathBuf>,
    /// Log clones and checkouts instead of performing them.
    pub skip_mutations: bool,
    /// Roots replacing every manifest's `_root`.
    pub root_overrides: Option<ValueSpec>,
    /// Backend tokens whose dependencies are skipped.
    pub skip: BTreeSet<SourceKey>,
    /// Whether the top-level `_self` entry may replace the binary.
    pub self_update: bool,
}

impl Settings {
    /// Build settings from parsed arguments and the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a `--root` or `--skip` value is malformed or no
    /// default repository can be determined.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let repos = if cli.repos.is_empty() {
            vec![default_repository()?]
        } else {
            cli.repos.clone()
        };
        let env_skip = std::env::var(SKIP_UPDATES_ENV).ok();
        Ok(Self {
            repos,
            skip_mutations: cli.dry_run || mutations_disabled(env_skip.as_deref()),
            root_overrides: parse_roots(&cli.roots)?,
            skip: parse_skip(&cli.skip)?,
            self_update: !cli.no_self_update,
        })
    }
}

/// Parse `--root TYPE:URL` values.  A later value for the same type wins.
///
/// # Errors
///
/// Returns an error for a value without a `TYPE:` prefix.
pub fn parse_roots(values: &[String]) -> Result<Option<ValueSpec>> {
    if values.is_empty() {
        return Ok(None);
    }
    let mut roots = ValueSpec::default();
    for value in values {
        let (key, url) = match value.strip_prefix("*:") {
            Some(url) => (SourceKey::Wildcard, url),
            None => match split_token(value) {
                (SourceKey::Wildcard, _) => {
                    bail!("invalid --root value {value:?}: expected TYPE:URL (hg, git or *)")
                }
                typed => typed,
            },
        };
        roots.insert(key, url.to_string());
    }
    Ok(Some(roots))
}

/// Parse `--skip` tokens.
///
/// # Errors
///
/// Returns an error for a token that names no backend.
pub fn parse_skip(values: &[String]) -> Result<BTreeSet<SourceKey>> {
    values
        .iter()
        .map(|token| match token.trim() {
            "*" => Ok(SourceKey::Wildcard),
            other => crate::vcs::VcsKind::from_token(other)
                .map(SourceKey::Vcs)
                .with_context(|| format!("unknown backend {other:?} in --skip")),
        })
        .collect()
}

/// Directory resolved when no repository is given.
///
/// Order: `$ENSURE_DEPS_ROOT`, then a directory holding a manifest next to
/// or one level above the executable, then the current directory.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn default_repository() -> Result<PathBuf> {
    if let Ok(root) = std::env::var(ROOT_ENV)
        && !root.is_empty()
    {
        return Ok(PathBuf::from(root));
    }

    if let Ok(exe) = std::env::current_exe()
        && let Some(found) = exe.parent().and_then(manifest_near)
    {
        return Ok(found);
    }

    std::env::current_dir().context("determining current directory")
}

/// `dir` or its parent, whichever first holds a manifest.
fn manifest_near(dir: &Path) -> Option<PathBuf> {
    [Some(dir), dir.parent()]
        .into_iter()
        .flatten()
        .find(|candidate| candidate.join(manifest::FILE_NAME).is_file())
        .and_then(|found| dunce::canonicalize(found).ok())
}
