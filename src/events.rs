// src/events.rs
//! Machine-readable event logging for audit trails.
//!
//! Events are appended to `<output_dir>/events.jsonl`.

use anyhow::Result;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

pub const EVENTS_FILE: &str = "events.jsonl";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    RunStarted {
        root: String,
        fix_mode: bool,
        workers: usize,
    },
    FixApplied {
        path: String,
        tool: String,
    },
    FixRolledBack {
        path: String,
        tool: String,
        reason: String,
    },
    FixAborted {
        path: String,
        tool: String,
        reason: String,
    },
    BackupsSwept {
        root: String,
        removed: usize,
    },
    RunFinished {
        total: usize,
        passed: usize,
        failed: usize,
        fixed: usize,
    },
    RunInterrupted {
        completed: usize,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CodexEvent {
    pub timestamp: u64,
    pub kind: EventKind,
}

/// Appends events as JSON lines. Clones share one write lock, so lines
/// from concurrent workers never interleave.
#[derive(Debug, Clone)]
pub struct EventLogger {
    log_path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl EventLogger {
    #[must_use]
    pub fn new(output_dir: &Path) -> Self {
        Self {
            log_path: output_dir.join(EVENTS_FILE),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.log_path
    }

    pub fn log(&self, kind: EventKind) {
        // Best-effort: a failed audit write must not fail the run.
        if let Ok(json) = Self::serialize_event(kind) {
            if let Err(e) = self.append_to_file(&json) {
                tracing::debug!("event log write failed: {e}");
            }
        }
    }

    fn serialize_event(kind: EventKind) -> Result<String> {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
        let event = CodexEvent { timestamp, kind };
        Ok(serde_json::to_string(&event)?)
    }

    fn append_to_file(&self, line: &str) -> Result<()> {
        let mut record = String::with_capacity(line.len() + 1);
        record.push_str(line);
        record.push('\n');

        let _guard = self.write_lock.lock();
        if let Some(parent) = self.log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        file.write_all(record.as_bytes())?;
        Ok(())
    }
}
