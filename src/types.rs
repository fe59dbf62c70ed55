// src/types.rs
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::lang::Lang;

/// A file selected for analysis: absolute path plus detected language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub path: PathBuf,
    pub lang: Lang,
}

impl FileTask {
    #[must_use]
    pub fn new(path: PathBuf, lang: Lang) -> Self {
        Self { path, lang }
    }

    /// Builds a task from a path, detecting the language from its extension.
    #[must_use]
    pub fn detect(path: &Path) -> Option<Self> {
        Lang::from_path(path).map(|lang| Self::new(path.to_path_buf(), lang))
    }
}

/// Outcome of analyzing a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub file_path: String,
    pub language: String,
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub was_fixed: bool,
}

impl AnalysisResult {
    /// Result for a file whose language has no configured tools.
    #[must_use]
    pub fn unsupported(task: &FileTask) -> Self {
        Self {
            file_path: task.path.to_string_lossy().to_string(),
            language: task.lang.label().to_string(),
            success: false,
            errors: vec!["Unsupported language/extension".to_string()],
            warnings: Vec::new(),
            was_fixed: false,
        }
    }

    /// Assembles a result; success is derived from the error list.
    #[must_use]
    pub fn from_parts(
        task: &FileTask,
        errors: Vec<String>,
        warnings: Vec<String>,
        was_fixed: bool,
    ) -> Self {
        Self {
            file_path: task.path.to_string_lossy().to_string(),
            language: task.lang.label().to_string(),
            success: errors.is_empty(),
            errors,
            warnings,
            was_fixed,
        }
    }
}

/// Totals for one run, persisted in the history file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub total_files: usize,
    pub passed: usize,
    pub failed: usize,
    pub fixed: usize,
}

impl RunSummary {
    /// Derives the run totals from the complete result set.
    ///
    /// `total_files == passed + failed` holds by construction.
    #[must_use]
    pub fn compute(results: &[AnalysisResult], timestamp: String) -> Self {
        let total_files = results.len();
        let passed = results.iter().filter(|r| r.success).count();
        let fixed = results.iter().filter(|r| r.was_fixed).count();
        Self {
            timestamp,
            total_files,
            passed,
            failed: total_files - passed,
            fixed,
        }
    }

    /// Same as [`RunSummary::compute`], stamped with the current local time.
    #[must_use]
    pub fn now(results: &[AnalysisResult]) -> Self {
        Self::compute(results, current_timestamp())
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.failed > 0
    }
}

/// Local wall-clock time in the history file's format.
#[must_use]
pub fn current_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
