use std::path::PathBuf;

use clap::Parser;

/// Stagehand - incremental file and database deployment
#[derive(Parser, Debug)]
#[command(name = "stagehand")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Deployment config (.json or .toml)
    pub config: PathBuf,

    /// Show what would be done without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Treat every file and script as changed
    #[arg(long)]
    pub ignore_cache: bool,

    /// Delete every destination file and drop databases first
    #[arg(long)]
    pub clean_install: bool,

    /// Diff against the change cache instead of listing the destination
    #[arg(long)]
    pub cache_only: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Maximum concurrent transfers
    #[arg(long)]
    pub concurrency: Option<usize>,
}
