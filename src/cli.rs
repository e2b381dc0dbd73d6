//! Command-line argument definitions.
use clap::Parser;
use std::path::PathBuf;

/// Command-line interface of the dependency resolver.
#[derive(Parser, Debug)]
#[command(
    name = "ensure-deps",
    about = "Verify dependencies for a set of repositories, by default the repository of this tool",
    version = option_env!("ENSURE_DEPS_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
)]
pub struct Cli {
    /// Repository paths
    #[arg(value_name = "REPOSITORY")]
    pub repos: Vec<PathBuf>,

    /// Suppress informational output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log clones and checkouts without performing them
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Root URL for a backend, replacing every manifest's `_root` (repeatable)
    #[arg(long = "root", value_name = "TYPE:URL")]
    pub roots: Vec<String>,

    /// Skip dependencies whose declared backends are all listed
    #[arg(long, value_delimiter = ',', value_name = "TOKEN")]
    pub skip: Vec<String>,

    /// Never replace this binary from the manifest's `_self` entry
    #[arg(long)]
    pub no_self_update: bool,
}
