// src/history.rs
//! Run history persistence and trend computation.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::types::RunSummary;

/// Direction of the failed-file count relative to the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    /// No previous run to compare against.
    Baseline,
    /// Fewer failed files, by this many.
    Improved(usize),
    /// More failed files, by this many.
    Regressed(usize),
    Stable,
}

impl Trend {
    /// `current - previous` failed count; negative is an improvement.
    #[must_use]
    pub fn between(previous: &RunSummary, current: &RunSummary) -> Self {
        use std::cmp::Ordering;
        match current.failed.cmp(&previous.failed) {
            Ordering::Less => Self::Improved(previous.failed - current.failed),
            Ordering::Greater => Self::Regressed(current.failed - previous.failed),
            Ordering::Equal => Self::Stable,
        }
    }

    /// Signed change in failed files, `None` for a baseline.
    #[must_use]
    pub fn delta(self) -> Option<i64> {
        let signed = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        match self {
            Self::Baseline => None,
            Self::Improved(n) => Some(-signed(n)),
            Self::Regressed(n) => Some(signed(n)),
            Self::Stable => Some(0),
        }
    }
}

/// Compares `current` with the last entry of `prior` and returns the trend
/// together with `prior + [current]`.
#[must_use]
pub fn update(current: &RunSummary, prior: &[RunSummary]) -> (Trend, Vec<RunSummary>) {
    let trend = prior
        .last()
        .map_or(Trend::Baseline, |last| Trend::between(last, current));
    let mut history = prior.to_vec();
    history.push(current.clone());
    (trend, history)
}

/// What [`record_run`] reports back for display.
#[derive(Debug, Clone)]
pub struct TrendReport {
    pub trend: Trend,
    pub previous: Option<RunSummary>,
}

/// JSON-array history file.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all recorded runs, oldest first. A missing or unreadable
    /// file yields an empty history.
    #[must_use]
    pub fn load(&self) -> Vec<RunSummary> {
        if !self.path.exists() {
            return Vec::new();
        }
        match self.try_load() {
            Ok(history) => history,
            Err(e) => {
                warn!("Ignoring unreadable history {}: {e:#}", self.path.display());
                Vec::new()
            }
        }
    }

    fn try_load(&self) -> Result<Vec<RunSummary>> {
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        serde_json::from_str(&content).context("Failed to parse history")
    }

    /// Replaces the stored history (temp file + rename).
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn save(&self, history: &[RunSummary]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(history)?;
        atomic_write(&self.path, &content)
    }
}

/// Loads history, computes the trend for `summary`, appends it and saves.
///
/// # Errors
/// Returns error if the updated history cannot be saved.
pub fn record_run(summary: &RunSummary, store: &HistoryStore) -> Result<TrendReport> {
    let prior = store.load();
    let previous = prior.last().cloned();
    let (trend, history) = update(summary, &prior);
    store.save(&history)?;
    Ok(TrendReport { trend, previous })
}

fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");

    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp to {}", path.display()))?;

    Ok(())
}
