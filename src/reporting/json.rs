// src/reporting/json.rs
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::AnalysisResult;

/// Writes `results` as a pretty JSON array to
/// `<output_dir>/codex_report_<unix-seconds>.json` and returns the path.
///
/// # Errors
/// Returns error if the directory or file cannot be written.
pub fn export_results(results: &[AnalysisResult], output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let stamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let path = output_dir.join(format!("codex_report_{stamp}.json"));
    let json = serde_json::to_string_pretty(results)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
