// src/exit.rs
//! Standardized process exit codes for `codex`.
//!
//! Automation callers can tell a blocked quality gate apart from an
//! internal fault and from a user interruption.

use std::process::Termination;

use colored::Colorize;

use crate::types::RunSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum CodexExit {
    /// Every analyzed file passed.
    Success = 0,
    /// At least one file failed its checks (merge blocked).
    Blocked = 1,
    /// Internal fault (config, I/O, history, thread pool).
    Error = 2,
    /// The run was interrupted by the user.
    Interrupted = 130,
}

impl CodexExit {
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Maps a completed run onto the gate outcome.
    #[must_use]
    pub fn from_summary(summary: &RunSummary) -> Self {
        if summary.failed > 0 {
            Self::Blocked
        } else {
            Self::Success
        }
    }
}

impl Termination for CodexExit {
    fn report(self) -> std::process::ExitCode {
        // Every variant fits in 0..=255.
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        std::process::ExitCode::from(self.code() as u8)
    }
}

/// Reports a handler error on stderr and maps it to [`CodexExit::Error`].
impl From<anyhow::Result<CodexExit>> for CodexExit {
    fn from(res: anyhow::Result<CodexExit>) -> Self {
        match res {
            Ok(code) => code,
            Err(e) => {
                eprintln!("{} {e:#}", "Error:".red());
                Self::Error
            }
        }
    }
}
