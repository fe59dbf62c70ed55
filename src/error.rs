// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Run-aborting faults. Per-file problems never surface here; they are
/// folded into the file's `AnalysisResult`.
#[derive(Debug, Error)]
pub enum CodexError {
    #[error("Scan root does not exist or is not a directory: {0}")]
    BadRoot(PathBuf),

    #[error("Worker pool error: {0}")]
    Pool(String),
}

pub type Result<T> = std::result::Result<T, CodexError>;

impl From<rayon::ThreadPoolBuildError> for CodexError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        CodexError::Pool(e.to_string())
    }
}
