//! Resolve every requested repository, then apply a pending self-update.
use anyhow::Result;
use std::path::Path;

use crate::config::Settings;
use crate::engine::{self, Context};
use crate::logging::Log;
use crate::self_update::{self, SelfUpdate};
use crate::vcs::Backends;

/// How the engine was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// Run as the program's entry point; the process may restart itself.
    TopLevel,
    /// Embedded in another program; a replaced binary is only reported.
    Component,
}

/// What the caller should do after [`run`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All repositories were processed.
    Converged,
    /// The binary was replaced; restart it with the same arguments.
    Restart,
}

/// Resolve `settings.repos` in order.
///
/// When a top-level manifest names a canonical binary that differs from
/// `own_binary`, the binary is replaced and processing stops so the new
/// version can handle the remaining work.
///
/// # Errors
///
/// Returns the first resolution error, or an error if the binary cannot be
/// replaced.
pub fn run(
    settings: &Settings,
    log: &dyn Log,
    backends: &Backends,
    own_binary: &Path,
    invocation: Invocation,
) -> Result<RunOutcome> {
    let ctx = Context {
        backends,
        log,
        skip_mutations: settings.skip_mutations,
        root_overrides: settings.root_overrides.as_ref(),
        skip: &settings.skip,
    };

    for repo in &settings.repos {
        let resolution = engine::resolve(&ctx, repo, settings.self_update)?;
        if let Some(source) = resolution.self_update_source
            && update_binary(&ctx, &source, own_binary, invocation)?
        {
            return Ok(RunOutcome::Restart);
        }
    }
    Ok(RunOutcome::Converged)
}

/// Replace `own_binary` with `source` if they differ.
///
/// Returns `true` if the process should restart.
fn update_binary(
    ctx: &Context<'_>,
    source: &Path,
    own_binary: &Path,
    invocation: Invocation,
) -> Result<bool> {
    let outcome = if ctx.skip_mutations {
        self_update::check(source, own_binary)?
    } else {
        self_update::apply(source, own_binary)?
    };

    match outcome {
        SelfUpdate::SourceMissing => {
            ctx.log.warn(&format!(
                "File {} doesn't exist, skipping self-update",
                source.display()
            ));
            Ok(false)
        }
        SelfUpdate::UpToDate { digest } => {
            ctx.log
                .debug(&format!("{} is current ({digest})", own_binary.display()));
            Ok(false)
        }
        SelfUpdate::Differs { .. } if ctx.skip_mutations => {
            ctx.log.dry_run(&format!(
                "would update {} from {}",
                own_binary.display(),
                source.display()
            ));
            Ok(false)
        }
        SelfUpdate::Differs { current, canonical } => {
            ctx.log.info(&format!(
                "Updating {} from {}, don't forget to commit",
                own_binary.display(),
                source.display()
            ));
            ctx.log.debug(&format!("sha256 {current} -> {canonical}"));
            match invocation {
                Invocation::TopLevel => {
                    ctx.log
                        .info(&format!("Restarting {}", own_binary.display()));
                    Ok(true)
                }
                Invocation::Component => {
                    ctx.log.warn(&format!(
                        "Cannot restart {} automatically, please rerun",
                        own_binary.display()
                    ));
                    Ok(false)
                }
            }
        }
    }
}
