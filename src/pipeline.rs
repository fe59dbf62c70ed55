// src/pipeline.rs
//! Per-file processing: fix phase under the file's lock, then check phase.

use tracing::debug;

use crate::config::{Config, ToolDefinition};
use crate::constants::MAX_ERROR_LINES_PER_TOOL;
use crate::events::{EventKind, EventLogger};
use crate::fix::{FileLockRegistry, FixOutcome, FixTransaction, RollbackCause};
use crate::tools::{ToolInvoker, ToolOutcome, ToolOutput};
use crate::types::{AnalysisResult, FileTask};

/// Findings accumulated while processing one file.
#[derive(Debug, Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
    was_fixed: bool,
}

/// Turns one `FileTask` into one `AnalysisResult`. Never fails: every
/// tool problem ends up as an error or warning line.
pub struct AnalysisPipeline<'a> {
    config: &'a Config,
    invoker: &'a ToolInvoker,
    locks: &'a FileLockRegistry,
    events: Option<&'a EventLogger>,
}

impl<'a> AnalysisPipeline<'a> {
    #[must_use]
    pub fn new(config: &'a Config, invoker: &'a ToolInvoker, locks: &'a FileLockRegistry) -> Self {
        Self {
            config,
            invoker,
            locks,
            events: None,
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: &'a EventLogger) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn process(&self, task: &FileTask) -> AnalysisResult {
        let tools = self.config.tools_for(task.lang.key());
        if tools.is_empty() {
            return AnalysisResult::unsupported(task);
        }

        let mut findings = Findings::default();
        if self.config.settings.fix_mode {
            self.fix_phase(task, tools, &mut findings);
        }
        self.check_phase(task, tools, &mut findings);

        AnalysisResult::from_parts(task, findings.errors, findings.warnings, findings.was_fixed)
    }

    fn fix_phase(&self, task: &FileTask, tools: &[ToolDefinition], findings: &mut Findings) {
        let fixers: Vec<&ToolDefinition> = tools.iter().filter(|t| t.is_fixer()).collect();
        if fixers.is_empty() {
            return;
        }

        let _guard = self.locks.acquire(&task.path);
        for tool in fixers {
            let outcome = FixTransaction::new(&task.path, tool).run(self.invoker);
            if !self.record_fix(task, tool, outcome, findings) {
                break;
            }
        }
    }

    /// Folds one fix outcome into `findings`. Returns whether the next
    /// fixer should be tried.
    fn record_fix(
        &self,
        task: &FileTask,
        tool: &ToolDefinition,
        outcome: FixOutcome,
        findings: &mut Findings,
    ) -> bool {
        let name = &tool.name;
        match outcome {
            FixOutcome::Applied => {
                findings.was_fixed = true;
                self.log(EventKind::FixApplied {
                    path: display(task),
                    tool: name.clone(),
                });
                false
            }
            FixOutcome::Unavailable { .. } => {
                findings.warnings.push(format!("{name} not available. Install it."));
                true
            }
            FixOutcome::RolledBack { cause, detail } => {
                let line = rollback_line(name, &cause, &detail);
                match cause {
                    RollbackCause::Failure { .. } => findings.warnings.push(line.clone()),
                    RollbackCause::Timeout { .. } | RollbackCause::Fault => {
                        findings.errors.push(line.clone());
                    }
                }
                self.log(EventKind::FixRolledBack {
                    path: display(task),
                    tool: name.clone(),
                    reason: line,
                });
                true
            }
            FixOutcome::Aborted { reason } => {
                findings.warnings.push(format!("[{name}] fix skipped: {reason}"));
                self.log(EventKind::FixAborted {
                    path: display(task),
                    tool: name.clone(),
                    reason,
                });
                false
            }
            FixOutcome::RollbackFailed { backup, detail } => {
                findings.errors.push(format!(
                    "[{name}] rollback failed, original kept at {}: {detail}",
                    backup.display()
                ));
                false
            }
        }
    }

    fn check_phase(&self, task: &FileTask, tools: &[ToolDefinition], findings: &mut Findings) {
        for tool in tools.iter().filter(|t| t.is_checker()) {
            let outcome = self.invoker.run(&task.path, tool);
            debug!(tool = %tool.name, code = outcome.exit_code(), "check finished");
            let name = &tool.name;
            match outcome {
                ToolOutcome::Completed(out) => findings.errors.extend(check_errors(name, &out)),
                ToolOutcome::Unavailable { .. } => {
                    findings.warnings.push(format!("{name} not available. Install it."));
                }
                ToolOutcome::TimedOut { after } => findings
                    .errors
                    .push(format!("[{name}] timed out after {}s", after.as_secs())),
                ToolOutcome::Failed { message } => findings
                    .errors
                    .push(format!("[{name}] execution failed: {message}")),
            }
        }
    }

    fn log(&self, kind: EventKind) {
        if let Some(events) = self.events {
            events.log(kind);
        }
    }
}

/// Error lines for a checker that ran to completion. Clean means exit 0
/// and nothing on stderr.
fn check_errors(name: &str, out: &ToolOutput) -> Vec<String> {
    if out.passed() && out.stderr.trim().is_empty() {
        return Vec::new();
    }
    let lines: Vec<String> = out
        .lines()
        .take(MAX_ERROR_LINES_PER_TOOL)
        .map(|l| format!("[{name}] {}", l.trim_end()))
        .collect();
    if lines.is_empty() {
        vec![format!("Exit code {} from {name}", out.exit_code)]
    } else {
        lines
    }
}

fn rollback_line(name: &str, cause: &RollbackCause, detail: &str) -> String {
    let what = match cause {
        RollbackCause::Failure { exit_code } => format!("fix failed with exit code {exit_code}"),
        RollbackCause::Timeout { after } => format!("fix timed out after {}s", after.as_secs()),
        RollbackCause::Fault => format!("fix could not run: {detail}"),
    };
    match cause {
        RollbackCause::Failure { .. } if !detail.is_empty() => {
            format!("[{name}] {what} ({detail}); changes rolled back")
        }
        _ => format!("[{name}] {what}; changes rolled back"),
    }
}

fn display(task: &FileTask) -> String {
    task.path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Lang;

    fn out(code: i32, stdout: &str, stderr: &str) -> ToolOutput {
        ToolOutput {
            exit_code: code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    #[test]
    fn clean_checker_adds_nothing() {
        assert!(check_errors("lint", &out(0, "all good\n", "")).is_empty());
    }

    #[test]
    fn failing_checker_keeps_first_five_lines_tagged() {
        let stdout = "l1\nl2\n\nl3\n";
        let stderr = "e1\ne2\ne3\n";
        let errs = check_errors("lint", &out(1, stdout, stderr));
        assert_eq!(
            errs,
            vec!["[lint] l1", "[lint] l2", "[lint] l3", "[lint] e1", "[lint] e2"]
        );
    }

    #[test]
    fn silent_failure_names_exit_code() {
        assert_eq!(
            check_errors("lint", &out(7, "", "  \n")),
            vec!["Exit code 7 from lint".to_string()]
        );
    }

    #[test]
    fn stderr_alone_is_an_error() {
        let errs = check_errors("lint", &out(0, "", "deprecated flag\n"));
        assert_eq!(errs, vec!["[lint] deprecated flag".to_string()]);
    }

    #[test]
    fn language_without_tools_is_unsupported() {
        let config = Config::default();
        let invoker = ToolInvoker::new(config.settings.default_timeout());
        let locks = FileLockRegistry::new();
        let pipeline = AnalysisPipeline::new(&config, &invoker, &locks);

        let task = FileTask::new("/x/main.go".into(), Lang::Go);
        let result = pipeline.process(&task);
        assert!(!result.success);
        assert_eq!(result.errors, vec!["Unsupported language/extension".to_string()]);
        assert_eq!(result.language, "Go");
    }

    #[test]
    fn rollback_line_mentions_cause() {
        let l = rollback_line("black", &RollbackCause::Failure { exit_code: 123 }, "bad input");
        assert_eq!(l, "[black] fix failed with exit code 123 (bad input); changes rolled back");
        let t = rollback_line(
            "black",
            &RollbackCause::Timeout {
                after: std::time::Duration::from_secs(30),
            },
            "",
        );
        assert!(t.contains("timed out after 30s"));
    }
}
