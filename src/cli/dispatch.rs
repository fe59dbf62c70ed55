//! Command dispatch logic extracted from the binary.

use super::args::Commands;
use super::handlers::{handle_clean, handle_config, handle_history, handle_run};
use crate::exit::CodexExit;
use anyhow::Result;

/// Executes the parsed command.
///
/// # Errors
/// Returns error if the command handler fails.
pub fn execute(command: Commands, verbose: bool) -> Result<CodexExit> {
    match command {
        Commands::Check(args) => handle_run(&args, false, verbose),
        Commands::Fix(args) => handle_run(&args, true, verbose),
        Commands::History => handle_history(),
        Commands::Clean { path } => handle_clean(&path),
        Commands::Config => handle_config(),
    }
}
