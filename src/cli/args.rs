use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "codex", version, about = "Concurrent code quality gate")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Print every file as it completes and enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configured checkers over a tree
    Check(RunArgs),
    /// Run fixers (with rollback) and then checkers over a tree
    Fix(RunArgs),
    /// Show the most recent runs
    History,
    /// Remove orphaned `.codex.bak` files left by a crashed run
    Clean {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
    /// Show the effective configuration
    Config,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Directory to analyze
    #[arg(default_value = ".")]
    pub path: PathBuf,
    /// Number of files processed concurrently
    #[arg(long, short = 'j')]
    pub workers: Option<usize>,
    /// Default per-tool timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}
