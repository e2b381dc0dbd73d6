//! `ensure-deps` entry point.
use anyhow::{Context as _, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

use ensure_deps_cli::cli::Cli;
use ensure_deps_cli::commands::resolve::{self, Invocation, RunOutcome};
use ensure_deps_cli::config::Settings;
use ensure_deps_cli::exec::{Executor, SystemExecutor};
use ensure_deps_cli::logging::{self, Logger, Verbosity};
use ensure_deps_cli::{self_update, vcs::Backends};

const COMMAND: &str = "ensure-deps";

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    let verbosity = if args.quiet {
        Verbosity::Quiet
    } else if args.verbose {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    };
    logging::init_subscriber(verbosity, COMMAND);
    let log = Logger::new(COMMAND);

    match run(&args, &log) {
        Ok(code) => code,
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Cli, log: &Logger) -> Result<ExitCode> {
    let settings = Settings::from_cli(args)?;
    let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
    let backends = Backends::system(&executor);
    let own_binary = std::env::current_exe().context("locating the running binary")?;

    let outcome = resolve::run(&settings, log, &backends, &own_binary, Invocation::TopLevel);
    log.print_summary();
    match outcome? {
        RunOutcome::Converged => Ok(ExitCode::SUCCESS),
        RunOutcome::Restart => {
            let forwarded: Vec<_> = std::env::args_os().skip(1).collect();
            self_update::restart(&own_binary, &forwarded)
        }
    }
}
