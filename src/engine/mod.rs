//! Recursive dependency resolution.
//!
//! [`resolve`] converges the checkouts declared by a repository's manifest,
//! then recurses depth-first into each of them.  All run-wide inputs travel
//! in an immutable [`Context`]; the engine never touches its own binary and
//! only reports where a canonical copy of it lives.
pub mod url;

use anyhow::Result;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::manifest::{Manifest, USAGE};
use crate::config::spec::{DependencySpec, Location, SourceKey, ValueSpec};
use crate::error::ResolveError;
use crate::logging::{DependencyStatus, Log};
use crate::paths::safe_join;
use crate::vcs::{self, Backend, Backends, VcsKind};

/// Nesting level at which recursion stops.
pub const MAX_DEPTH: usize = 10;

/// Run-wide inputs shared by every level of the recursion.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// Available backends in detection order.
    pub backends: &'a Backends,
    /// Destination for progress, warnings and per-dependency results.
    pub log: &'a dyn Log,
    /// Log clones and checkouts instead of performing them.
    pub skip_mutations: bool,
    /// Roots replacing every manifest's `_root`.
    pub root_overrides: Option<&'a ValueSpec>,
    /// Backend tokens whose dependencies are skipped.
    pub skip: &'a BTreeSet<SourceKey>,
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("backends", &self.backends)
            .field("skip_mutations", &self.skip_mutations)
            .field("root_overrides", &self.root_overrides)
            .field("skip", &self.skip)
            .finish_non_exhaustive()
    }
}

/// Outcome of a top-level resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Canonical engine binary declared by the top-level `_self` entry.
    ///
    /// Set only when self-update was requested; the file may not exist.
    pub self_update_source: Option<PathBuf>,
}

/// Converge every dependency declared under `dir`, recursively.
///
/// A missing manifest is not an error.  When `self_update` is set and the
/// manifest declares `_self`, its validated location is returned for the
/// caller to act on.
///
/// # Errors
///
/// Returns an error on a path-safety violation, a revision that cannot be
/// resolved even after pulling, an unreadable manifest, or any failing
/// backend command.  Processing stops at the first such error.
pub fn resolve(ctx: &Context<'_>, dir: &Path, self_update: bool) -> Result<Resolution> {
    let Some(manifest) = resolve_at(ctx, dir, 0)? else {
        return Ok(Resolution::default());
    };
    let self_update_source = match manifest.self_path() {
        Some(path) if self_update => Some(safe_join(dir, path)?),
        _ => None,
    };
    Ok(Resolution { self_update_source })
}

/// Repository whose manifest is being processed.
struct Level<'m> {
    dir: &'m Path,
    kind: Option<VcsKind>,
    roots: &'m ValueSpec,
    depth: usize,
}

fn resolve_at(ctx: &Context<'_>, dir: &Path, depth: usize) -> Result<Option<Manifest>> {
    let Some(mut manifest) = Manifest::read(dir, ctx.log)? else {
        if depth == 0 {
            ctx.log.warn(&format!(
                "No dependencies file in directory {}, nothing to do...\n{USAGE}",
                dir.display()
            ));
        }
        return Ok(None);
    };
    if depth >= MAX_DEPTH {
        ctx.log.warn(&format!(
            "Too much subrepository nesting, ignoring {}",
            dir.display()
        ));
        return Ok(None);
    }
    if let Some(roots) = ctx.root_overrides {
        manifest.set_roots(roots.clone());
    }

    ctx.log.stage(&format!("Resolving dependencies in {}", dir.display()));
    if manifest.is_empty() {
        ctx.log.debug("The dependencies file declares no dependencies");
    }
    let no_roots = ValueSpec::default();
    let level = Level {
        dir,
        kind: ctx.backends.detect(dir),
        roots: manifest.roots().unwrap_or(&no_roots),
        depth,
    };
    for (key, spec) in manifest.dependencies() {
        ensure_dependency(ctx, &level, key, spec)?;
    }
    Ok(Some(manifest))
}

fn ensure_dependency(
    ctx: &Context<'_>,
    level: &Level<'_>,
    key: &str,
    spec: &DependencySpec,
) -> Result<()> {
    if is_skipped(spec, ctx.skip) {
        ctx.log.debug(&format!("Skipping {key}, all of its backends are skipped"));
        ctx.log
            .record(key, DependencyStatus::Skipped, Some("backend skipped"));
        return Ok(());
    }

    let target = safe_join(level.dir, key)?;
    let name = target.display().to_string();

    let Some(kind) = select_kind(ctx.backends, level.kind, spec, level.roots) else {
        ctx.log.warn(&format!(
            "No valid source / revision found to create {name}"
        ));
        ctx.log
            .record(key, DependencyStatus::Skipped, Some("no backend"));
        return Ok(());
    };
    let location = Location::merge(
        spec.get(SourceKey::Wildcard),
        spec.get(SourceKey::Vcs(kind)),
    );
    let (Some(source), Some(revision)) = (location.source.as_deref(), location.revision.as_deref())
    else {
        ctx.log.warn(&format!(
            "No valid source / revision found to create {name}"
        ));
        ctx.log
            .record(key, DependencyStatus::Skipped, Some("no source or revision"));
        return Ok(());
    };
    let backend = ctx
        .backends
        .get(kind)
        .ok_or_else(|| ResolveError::UnknownBackend(kind.to_string()))?;

    let mut cloned = false;
    if !target.exists() {
        let url = url::clone_url(
            &backend.normalize_url(root_for(level.roots, kind)),
            &backend.normalize_url(source),
        );
        if ctx.skip_mutations {
            ctx.log
                .dry_run(&format!("would clone {url} into {name}"));
            ctx.log
                .record(key, DependencyStatus::DryRun, Some("not cloned"));
            return Ok(());
        }
        ctx.log
            .info(&format!("Cloning repository {url} into {name}"));
        vcs::clone_via_staging(&target, |staging| backend.clone_repo(&url, staging))?;
        if let Some(parent) = level.kind.and_then(|k| ctx.backends.get(k)) {
            parent.ignore(&target, level.dir)?;
        }
        cloned = true;
    }

    let status = update_checkout(ctx, backend, &target, revision, cloned)?;
    ctx.log.record(key, status, Some(revision));

    resolve_at(ctx, &target, level.depth + 1)?;
    Ok(())
}

/// Bring `target` to `revision`, pulling once if the reference is unknown.
fn update_checkout(
    ctx: &Context<'_>,
    backend: &dyn Backend,
    target: &Path,
    revision: &str,
    cloned: bool,
) -> Result<DependencyStatus> {
    let mut resolved = backend.revision_id(target, Some(revision))?;
    if resolved.is_empty() {
        ctx.log.info(&format!(
            "Revision {revision} is unknown, downloading remote changes"
        ));
        backend.pull(target)?;
        resolved = backend.revision_id(target, Some(revision))?;
        if resolved.is_empty() {
            return Err(ResolveError::UnknownRevision {
                revision: revision.to_string(),
                target: target.to_path_buf(),
            }
            .into());
        }
    }

    let current = backend.revision_id(target, None)?;
    if resolved == current {
        ctx.log.debug(&format!(
            "{} is at revision {resolved}",
            target.display()
        ));
        return Ok(if cloned {
            DependencyStatus::Cloned
        } else {
            DependencyStatus::UpToDate
        });
    }

    if ctx.skip_mutations {
        ctx.log.dry_run(&format!(
            "would update {} to revision {revision}",
            target.display()
        ));
        return Ok(DependencyStatus::DryRun);
    }
    ctx.log.info(&format!(
        "Updating repository {} to revision {resolved}",
        target.display()
    ));
    backend.checkout(target, &resolved, revision)?;
    Ok(if cloned {
        DependencyStatus::Cloned
    } else {
        DependencyStatus::Updated
    })
}

/// Whether every backend the entry declares is in `skip`.
///
/// An entry with only untyped values counts as declaring the wildcard.
fn is_skipped(spec: &DependencySpec, skip: &BTreeSet<SourceKey>) -> bool {
    if skip.is_empty() {
        return false;
    }
    let mut typed = spec.keys().filter(|k| *k != SourceKey::Wildcard).peekable();
    if typed.peek().is_none() {
        return skip.contains(&SourceKey::Wildcard);
    }
    typed.all(|k| skip.contains(&k))
}

/// Backend used for an entry.
///
/// A typed parent always dictates the backend.  Under an untyped parent the
/// first registered backend the entry or the roots name explicitly wins,
/// falling back to the first registered backend.
fn select_kind(
    backends: &Backends,
    parent: Option<VcsKind>,
    spec: &DependencySpec,
    roots: &ValueSpec,
) -> Option<VcsKind> {
    if parent.is_some() {
        return parent;
    }
    backends
        .kinds()
        .find(|kind| {
            spec.contains(SourceKey::Vcs(*kind)) || roots.contains(SourceKey::Vcs(*kind))
        })
        .or_else(|| backends.kinds().next())
}

/// Root for `kind`: the backend-specific root, else the wildcard root.
fn root_for(roots: &ValueSpec, kind: VcsKind) -> &str {
    roots
        .get(SourceKey::Vcs(kind))
        .filter(|root| !root.is_empty())
        .or_else(|| roots.get(SourceKey::Wildcard))
        .map_or("", String::as_str)
}
