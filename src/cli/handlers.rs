// src/cli/handlers.rs
use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::path::Path;
use tracing::warn;

use crate::cli::args::RunArgs;
use crate::config::Config;
use crate::engine::Engine;
use crate::events::EventLogger;
use crate::exit::CodexExit;
use crate::history::{self, HistoryStore};
use crate::reporting;
use crate::signal::CancelToken;

/// Handles `check` and `fix`.
///
/// # Errors
/// Returns error on invalid flags or if the run cannot start.
pub fn handle_run(args: &RunArgs, fix_mode: bool, verbose: bool) -> Result<CodexExit> {
    let mut config = Config::load();
    let settings = &mut config.settings;
    settings.fix_mode = fix_mode;
    settings.verbose = verbose;
    if let Some(workers) = args.workers {
        if workers == 0 {
            bail!("--workers must be at least 1");
        }
        settings.max_workers = workers;
    }
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            bail!("--timeout must be at least 1 second");
        }
        settings.default_timeout = timeout;
    }

    run_gate(config, &args.path, &CancelToken::with_interrupt())
}

/// One quality-gate run over `root`: sweep, process, report, export,
/// record history. Returns the exit code the process should end with.
///
/// # Errors
/// Returns error if `root` is unusable, the pool cannot start, or the
/// history file cannot be written.
pub fn run_gate(config: Config, root: &Path, cancel: &CancelToken) -> Result<CodexExit> {
    let settings = config.settings.clone();
    let events = EventLogger::new(&settings.output_dir);
    let engine = Engine::new(config).with_events(events);

    if settings.fix_mode {
        let removed = engine.sweep_backups(root)?;
        reporting::print_sweep(root, removed);
    }

    let mode = if settings.fix_mode { "Fixing" } else { "Checking" };
    println!("{} {}", mode.cyan().bold(), root.display());

    let outcome = engine
        .run(root, cancel, |r| reporting::print_progress(r, settings.verbose))
        .with_context(|| format!("Failed to analyze {}", root.display()))?;
    if !settings.verbose {
        println!();
    }
    if outcome.unreadable > 0 {
        println!(
            "{}",
            format!(
                "Skipped {} unreadable entries under {}",
                outcome.unreadable,
                root.display()
            )
            .yellow()
        );
    }

    if outcome.interrupted {
        println!(
            "{}",
            format!(
                "Interrupted after {} files; in-flight fixes were completed or rolled back.",
                outcome.results.len()
            )
            .yellow()
        );
        if settings.fix_mode {
            match engine.sweep_backups(root) {
                Ok(removed) => reporting::print_sweep(root, removed),
                Err(e) => warn!("backup sweep after interrupt failed: {e}"),
            }
        }
        return Ok(CodexExit::Interrupted);
    }

    reporting::print_final_report(&outcome.results, &outcome.summary);

    match reporting::export_results(&outcome.results, &settings.output_dir) {
        Ok(path) => println!(
            "\n{}",
            format!("Exported detailed report to: {}", path.display()).cyan()
        ),
        Err(e) => eprintln!("{} {e:#}", "Failed to export JSON report:".red()),
    }

    let store = HistoryStore::new(&settings.history_file);
    let trend = history::record_run(&outcome.summary, &store)
        .with_context(|| format!("Failed to update history {}", store.path().display()))?;
    reporting::print_trend(&trend, &outcome.summary);

    Ok(CodexExit::from_summary(&outcome.summary))
}

/// Handles `history`.
///
/// # Errors
/// Infallible today; kept fallible like the other handlers.
pub fn handle_history() -> Result<CodexExit> {
    let config = Config::load();
    let store = HistoryStore::new(&config.settings.history_file);
    reporting::print_history(&store.load());
    Ok(CodexExit::Success)
}

/// Handles `clean`.
///
/// # Errors
/// Returns error if `path` does not exist.
pub fn handle_clean(path: &Path) -> Result<CodexExit> {
    let config = Config::load();
    let events = EventLogger::new(&config.settings.output_dir);
    let removed = Engine::new(config).with_events(events).sweep_backups(path)?;
    reporting::print_sweep(path, removed);
    Ok(CodexExit::Success)
}

/// Handles `config`.
///
/// # Errors
/// Infallible today; kept fallible like the other handlers.
pub fn handle_config() -> Result<CodexExit> {
    reporting::print_config(&Config::load());
    Ok(CodexExit::Success)
}
