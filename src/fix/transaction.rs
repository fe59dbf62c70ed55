//! One fixer invocation made safe against partial success.
//!
//! `Start -> BackedUp -> Applied | RolledBack(failure | timeout | fault)`.
//! After [`FixTransaction::run`] returns, the target holds either the
//! fixer's output (Applied) or its exact pre-fix bytes, and no backup
//! artifact remains unless restoring itself failed.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use super::backup::Backup;
use crate::config::ToolDefinition;
use crate::tools::{ToolInvoker, ToolOutcome};

/// Why a fix attempt was rolled back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackCause {
    /// The fixer exited with a non-zero code.
    Failure { exit_code: i32 },
    /// The fixer exceeded its timeout and was killed.
    Timeout { after: Duration },
    /// The fixer could not be run to completion.
    Fault,
}

/// Terminal state of one fix attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// Fixer exited 0; its changes are kept.
    Applied,
    /// Fixer executable not found; nothing was backed up or run.
    Unavailable { program: String },
    /// Changes were reverted from the backup.
    RolledBack { cause: RollbackCause, detail: String },
    /// No backup could be made, so the fixer was not run.
    Aborted { reason: String },
    /// Reverting failed; the backup artifact is left at `backup`.
    RollbackFailed { backup: PathBuf, detail: String },
}

/// A single (file, fixer) attempt. Callers hold the file's lock from
/// `FileLockRegistry` for the duration of [`FixTransaction::run`].
pub struct FixTransaction<'a> {
    target: &'a Path,
    tool: &'a ToolDefinition,
}

impl<'a> FixTransaction<'a> {
    #[must_use]
    pub fn new(target: &'a Path, tool: &'a ToolDefinition) -> Self {
        Self { target, tool }
    }

    /// Backs up, runs the fixer, then keeps or reverts.
    #[must_use]
    pub fn run(self, invoker: &ToolInvoker) -> FixOutcome {
        if invoker.locate(self.tool).is_none() {
            return FixOutcome::Unavailable {
                program: self.tool.program().unwrap_or_default().to_string(),
            };
        }

        let backup = match Backup::create(self.target) {
            Ok(b) => b,
            Err(e) => {
                return FixOutcome::Aborted {
                    reason: format!("could not back up {}: {e}", self.target.display()),
                }
            }
        };

        match invoker.run(self.target, self.tool) {
            ToolOutcome::Completed(out) if out.passed() => self.commit(backup),
            ToolOutcome::Completed(out) => self.rollback(
                backup,
                RollbackCause::Failure {
                    exit_code: out.exit_code,
                },
                out.stderr.trim().to_string(),
            ),
            ToolOutcome::TimedOut { after } => self.rollback(
                backup,
                RollbackCause::Timeout { after },
                format!("timed out after {}s", after.as_secs()),
            ),
            ToolOutcome::Failed { message } => self.rollback(backup, RollbackCause::Fault, message),
            ToolOutcome::Unavailable { program } => self.rollback(
                backup,
                RollbackCause::Fault,
                format!("Tool '{program}' disappeared before it could run"),
            ),
        }
    }

    fn commit(&self, backup: Backup) -> FixOutcome {
        let artifact = backup.path().to_path_buf();
        if let Err(e) = backup.discard() {
            warn!("fix applied but {} could not be removed: {e}", artifact.display());
        }
        debug!(tool = %self.tool.name, file = %self.target.display(), "fix applied");
        FixOutcome::Applied
    }

    fn rollback(&self, backup: Backup, cause: RollbackCause, detail: String) -> FixOutcome {
        let artifact = backup.path().to_path_buf();
        match backup.restore() {
            Ok(()) => {
                warn!(tool = %self.tool.name, file = %self.target.display(), ?cause, "fix rolled back");
                FixOutcome::RolledBack { cause, detail }
            }
            Err(e) => FixOutcome::RollbackFailed {
                detail: format!("{detail}; restore failed: {e}"),
                backup: artifact,
            },
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::fix::backup::backup_path_for;
    use std::fs;

    fn fixer(script: &str) -> ToolDefinition {
        ToolDefinition::fixer("fx", &["sh", "-c", script, "sh"])
    }

    fn invoker() -> ToolInvoker {
        ToolInvoker::new(Duration::from_secs(10))
    }

    fn setup(content: &str) -> (tempfile::TempDir, PathBuf) {
        let d = tempfile::tempdir().unwrap();
        let f = d.path().join("a.py");
        fs::write(&f, content).unwrap();
        (d, f)
    }

    #[test]
    fn success_keeps_changes_and_removes_backup() {
        let (_d, f) = setup("x=1\n");
        let tool = fixer("printf 'x = 1\\n' > \"$1\"");

        let outcome = FixTransaction::new(&f, &tool).run(&invoker());
        assert_eq!(outcome, FixOutcome::Applied);
        assert_eq!(fs::read_to_string(&f).unwrap(), "x = 1\n");
        assert!(!backup_path_for(&f).exists());
    }

    #[test]
    fn failure_restores_and_reports_stderr() {
        let (_d, f) = setup("x=1\n");
        let tool = fixer("echo garbage > \"$1\"; echo 'cannot parse' >&2; exit 123");

        let outcome = FixTransaction::new(&f, &tool).run(&invoker());
        assert_eq!(
            outcome,
            FixOutcome::RolledBack {
                cause: RollbackCause::Failure { exit_code: 123 },
                detail: "cannot parse".into()
            }
        );
        assert_eq!(fs::read_to_string(&f).unwrap(), "x=1\n");
        assert!(!backup_path_for(&f).exists());
    }

    #[test]
    fn timeout_restores() {
        let (_d, f) = setup("x=1\n");
        let tool = fixer("echo partial > \"$1\"; sleep 5").with_timeout(1);

        let outcome = FixTransaction::new(&f, &tool).run(&invoker());
        assert!(matches!(
            outcome,
            FixOutcome::RolledBack {
                cause: RollbackCause::Timeout { .. },
                ..
            }
        ));
        assert_eq!(fs::read_to_string(&f).unwrap(), "x=1\n");
        assert!(!backup_path_for(&f).exists());
    }

    #[test]
    fn deleted_target_is_recreated_on_rollback() {
        let (_d, f) = setup("keep me\n");
        let tool = fixer("rm \"$1\"; exit 1");

        let outcome = FixTransaction::new(&f, &tool).run(&invoker());
        assert!(matches!(outcome, FixOutcome::RolledBack { .. }));
        assert_eq!(fs::read_to_string(&f).unwrap(), "keep me\n");
    }

    #[test]
    fn missing_fixer_touches_nothing() {
        let (_d, f) = setup("x=1\n");
        let tool = ToolDefinition::fixer("ghost", &["codex-no-such-fixer-xyz"]);

        let outcome = FixTransaction::new(&f, &tool).run(&invoker());
        assert!(matches!(outcome, FixOutcome::Unavailable { .. }));
        assert!(!backup_path_for(&f).exists());
    }

    #[test]
    fn unreadable_target_aborts_before_running() {
        let d = tempfile::tempdir().unwrap();
        let f = d.path().join("gone.py");
        let marker = d.path().join("ran");
        let tool = fixer(&format!("touch '{}'", marker.display()));

        let outcome = FixTransaction::new(&f, &tool).run(&invoker());
        assert!(matches!(outcome, FixOutcome::Aborted { .. }));
        assert!(!marker.exists());
    }
}
