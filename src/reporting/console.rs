use colored::Colorize;
use std::io::Write;
use std::path::Path;

use crate::config::Config;
use crate::constants::HISTORY_DISPLAY_WINDOW;
use crate::history::{Trend, TrendReport};
use crate::types::{AnalysisResult, RunSummary};

const RULE_WIDTH: usize = 70;
const PATH_WIDTH: usize = 30;
const ERRORS_SHOWN: usize = 3;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

fn thin_rule() -> String {
    "-".repeat(RULE_WIDTH)
}

fn banner(title: &str) {
    println!("\n{}", rule());
    println!("{}", format!("   {title}   ").bold());
    println!("{}", rule());
}

/// One progress mark per completed file: a dot, or a status line in
/// verbose mode.
pub fn print_progress(result: &AnalysisResult, verbose: bool) {
    if verbose {
        let mark = if result.success {
            "✓".green()
        } else {
            "✗".red()
        };
        println!("{mark} {}", result.file_path);
    } else {
        print!(".");
        let _ = std::io::stdout().flush();
    }
}

/// Final per-file table, totals and the quality gate verdict.
pub fn print_final_report(results: &[AnalysisResult], summary: &RunSummary) {
    banner("CODEX - FINAL REPORT");
    println!(
        "{}",
        format!("{:<8} | {:<10} | {:<30} | DETAILS", "STATUS", "TYPE", "FILE").bold()
    );
    println!("{}", thin_rule());

    for r in results {
        print_row(r);
    }

    println!("{}", thin_rule());
    println!(
        "Files: {} | {} | {} | {}",
        summary.total_files,
        format!("Passed: {}", summary.passed).green(),
        format!("Failed: {}", summary.failed).red(),
        format!("Auto-Fixed: {}", summary.fixed).yellow()
    );

    if summary.is_blocked() {
        println!(
            "\n{}",
            format!(
                "[!] MERGE BLOCKED: Fix {} failed files to pass the Quality Gate.",
                summary.failed
            )
            .red()
        );
    }
}

fn print_row(r: &AnalysisResult) {
    let status = if r.success { "✓".green() } else { "✗".red() };
    let fix = if r.was_fixed { "🔧" } else { " " };

    let mut info = if r.success {
        "OK".to_string()
    } else {
        format!("{} Err", r.errors.len())
    };
    if r.was_fixed {
        info.push_str(" (Fixed)");
    }

    println!(
        "   {status} {fix}  | {:<10} | {:<30} | {info}",
        r.language,
        shorten(&r.file_path, PATH_WIDTH)
    );

    if !r.success {
        for e in r.errors.iter().take(ERRORS_SHOWN) {
            println!("         {}", format!("└─ {e}").red());
        }
    }
}

/// Keeps the tail of `path` so it fits in `width` characters.
fn shorten(path: &str, width: usize) -> String {
    let count = path.chars().count();
    if count <= width {
        return path.to_string();
    }
    let tail: String = path.chars().skip(count - (width - 3)).collect();
    format!("...{tail}")
}

pub fn print_trend(report: &TrendReport, current: &RunSummary) {
    banner("CODE QUALITY TREND ANALYSIS");

    let Some(previous) = &report.previous else {
        println!("{}", "No previous history found. Creating baseline.".cyan());
        return;
    };

    println!(
        "Last Scan ({}): Failed Files: {}",
        previous.timestamp, previous.failed
    );
    println!(
        "Current Scan ({}): Failed Files: {}",
        current.timestamp, current.failed
    );

    let line = match report.trend {
        Trend::Improved(n) => format!("⬆  Trend: Quality improved! Fewer failed files. ({n} change)")
            .green()
            .bold(),
        Trend::Regressed(n) => format!("⬇  Trend: Quality degraded. More failed files. ({n} change)")
            .red()
            .bold(),
        Trend::Stable | Trend::Baseline => "=  Trend: Quality remained stable. (0 change)"
            .yellow()
            .bold(),
    };
    println!("\n{line}");
}

/// Table of the most recent runs.
pub fn print_history(history: &[RunSummary]) {
    if history.is_empty() {
        println!("{}", "No analysis history found.".yellow());
        return;
    }

    banner(&format!("ANALYSIS HISTORY (Last {HISTORY_DISPLAY_WINDOW} Runs)"));
    println!(
        "{:<20} | {:<6} | {:<5} | {:<5} | {:<6}",
        "TIMESTAMP", "TOTAL", "PASS", "FAIL", "FIXED"
    );
    println!("{}", thin_rule());

    let start = history.len().saturating_sub(HISTORY_DISPLAY_WINDOW);
    for run in &history[start..] {
        println!(
            "{:<20} | {:<6} | {:<5} | {:<5} | {:<6}",
            run.timestamp, run.total_files, run.passed, run.failed, run.fixed
        );
    }
    println!("{}\n", rule());
}

pub fn print_config(config: &Config) {
    let s = &config.settings;
    banner("CURRENT CONFIGURATION");
    match &config.source {
        Some(path) => println!("Config File: {}", path.display()),
        None => println!("Config File: {}", "(built-in defaults)".dimmed()),
    }
    println!("Max Workers: {}", s.max_workers);
    println!("History File: {}", s.history_file.display());
    println!("Output Directory: {}", s.output_dir.display());
    println!("Default Timeout: {}s", s.default_timeout);
    let skips: Vec<&str> = s.skip_dirs.iter().map(String::as_str).collect();
    println!("Skip Directories: {}", skips.join(", "));

    let langs: Vec<&str> = config.supported_languages().collect();
    println!("\nSupported Languages: {}", langs.join(", "));
    for note in &config.diagnostics {
        println!("{} {note}", "warning:".yellow());
    }
    println!("{}\n", rule());
}

pub fn print_sweep(root: &Path, removed: usize) {
    if removed > 0 {
        println!(
            "{}",
            format!(
                "[CLEANUP] Removed {removed} orphaned backup files under {}.",
                root.display()
            )
            .yellow()
        );
    } else {
        println!("{}", "[CLEANUP] No orphaned backup files found.".green());
    }
}
