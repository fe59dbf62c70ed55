//! Runs one external tool against one file, bounded by a timeout.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::ToolDefinition;

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured output of a tool that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }

    /// Non-blank lines of stdout followed by non-blank lines of stderr.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .lines()
            .chain(self.stderr.lines())
            .filter(|l| !l.trim().is_empty())
    }
}

/// Every way a tool invocation can end. None of these is a Rust error:
/// callers turn them into result lines or rollbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Completed(ToolOutput),
    /// The executable could not be located.
    Unavailable { program: String },
    /// The deadline passed; the process (and its group on unix) was killed.
    TimedOut { after: Duration },
    /// Spawn or wait failed, or the process died from a signal.
    Failed { message: String },
}

impl ToolOutcome {
    pub const UNAVAILABLE_CODE: i32 = -1;
    pub const TIMEOUT_CODE: i32 = -2;
    pub const FAILED_CODE: i32 = -3;

    /// Exit code, with sentinels for the non-completed outcomes.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Completed(out) => out.exit_code,
            Self::Unavailable { .. } => Self::UNAVAILABLE_CODE,
            Self::TimedOut { .. } => Self::TIMEOUT_CODE,
            Self::Failed { .. } => Self::FAILED_CODE,
        }
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Completed(out) if out.passed())
    }
}

/// Executes tool definitions as child processes.
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    default_timeout: Duration,
}

impl ToolInvoker {
    #[must_use]
    pub fn new(default_timeout: Duration) -> Self {
        Self { default_timeout }
    }

    #[must_use]
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Resolves the tool's executable on `PATH` (or as given, if it
    /// contains a path separator).
    #[must_use]
    pub fn locate(&self, tool: &ToolDefinition) -> Option<PathBuf> {
        tool.program().and_then(|p| which::which(p).ok())
    }

    /// Runs `tool` against `path` with the file's directory as the working
    /// directory.
    #[must_use]
    pub fn run(&self, path: &Path, tool: &ToolDefinition) -> ToolOutcome {
        let Some(program) = tool.program() else {
            return ToolOutcome::Failed {
                message: format!("Tool '{}' has an empty command", tool.name),
            };
        };
        let Some(exe) = self.locate(tool) else {
            return ToolOutcome::Unavailable {
                program: program.to_string(),
            };
        };

        let timeout = tool.timeout_or(self.default_timeout);
        let cwd = path.parent().filter(|p| !p.as_os_str().is_empty());
        let args = tool.args_for(path);
        debug!(tool = %tool.name, file = %path.display(), ?args, "invoking");

        let mut cmd = Command::new(&exe);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        isolate_process_group(&mut cmd);

        match cmd.spawn() {
            Ok(child) => supervise(child, timeout),
            Err(e) => ToolOutcome::Failed {
                message: format!("Tool execution failed: {e}"),
            },
        }
    }
}

fn supervise(mut child: Child, timeout: Duration) -> ToolOutcome {
    let deadline = Instant::now() + timeout;
    let (tx, rx) = mpsc::channel();
    let mut pending = 0;
    if let Some(out) = child.stdout.take() {
        spawn_stream_reader(out, Stream::Stdout, tx.clone());
        pending += 1;
    }
    if let Some(err) = child.stderr.take() {
        spawn_stream_reader(err, Stream::Stderr, tx.clone());
        pending += 1;
    }
    drop(tx);

    match wait_until(&mut child, deadline) {
        Ok(Some(status)) => {
            // Background processes left behind may still hold the pipes.
            let streams = collect_streams(&rx, pending, deadline);
            kill_process_group(&child);
            match streams {
                Some((stdout, stderr)) => completed(status, stdout, stderr),
                None => ToolOutcome::TimedOut { after: timeout },
            }
        }
        Ok(None) => {
            terminate(&mut child);
            // Readers finish on their own once the pipes close.
            ToolOutcome::TimedOut { after: timeout }
        }
        Err(e) => {
            terminate(&mut child);
            ToolOutcome::Failed {
                message: format!("Tool execution failed: {e}"),
            }
        }
    }
}

fn completed(status: ExitStatus, stdout: String, stderr: String) -> ToolOutcome {
    match status.code() {
        Some(exit_code) => ToolOutcome::Completed(ToolOutput {
            exit_code,
            stdout,
            stderr,
        }),
        None => ToolOutcome::Failed {
            message: format!("Tool terminated by signal ({status})"),
        },
    }
}

/// Polls until the child exits or the deadline passes (`Ok(None)`).
fn wait_until(child: &mut Child, deadline: Instant) -> std::io::Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn spawn_stream_reader<R: Read + Send + 'static>(
    mut input: R,
    stream: Stream,
    tx: Sender<(Stream, Vec<u8>)>,
) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = input.read_to_end(&mut buf);
        let _ = tx.send((stream, buf));
    });
}

/// Waits for `pending` streams to reach EOF, or `None` once the deadline
/// passes with a pipe still open.
fn collect_streams(
    rx: &Receiver<(Stream, Vec<u8>)>,
    pending: usize,
    deadline: Instant,
) -> Option<(String, String)> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    for _ in 0..pending {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok((Stream::Stdout, bytes)) => stdout = bytes,
            Ok((Stream::Stderr, bytes)) => stderr = bytes,
            Err(RecvTimeoutError::Timeout) => return None,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Some((
        String::from_utf8_lossy(&stdout).into_owned(),
        String::from_utf8_lossy(&stderr).into_owned(),
    ))
}

/// Puts the tool in its own process group so a timeout can take down
/// everything it spawned, and so a terminal Ctrl-C reaches codex only.
#[cfg(unix)]
fn isolate_process_group(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn isolate_process_group(_cmd: &mut Command) {}

/// Kills the child (and its process group on unix) and reaps it.
fn terminate(child: &mut Child) {
    kill_process_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

/// Signals the whole group; harmless if the group is already gone.
#[cfg(unix)]
fn kill_process_group(child: &Child) {
    if let Ok(pid) = i32::try_from(child.id()) {
        // SAFETY: kill(2) with a negative pid signals the process group
        // created in `isolate_process_group`; no memory is touched.
        unsafe {
            libc::kill(-pid, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_child: &Child) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(name: &str, script: &str) -> ToolDefinition {
        ToolDefinition::checker(name, &["sh", "-c", script, "sh"])
    }

    fn invoker() -> ToolInvoker {
        ToolInvoker::new(Duration::from_secs(10))
    }

    #[test]
    fn captures_streams_and_exit_code() {
        let d = tempfile::tempdir().unwrap();
        let file = d.path().join("a.py");
        std::fs::write(&file, "").unwrap();

        let outcome = invoker().run(&file, &sh("t", "echo out; echo err >&2; exit 3"));
        let ToolOutcome::Completed(out) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(out.exit_code, 3);
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
    }

    #[test]
    fn file_path_is_the_last_argument_and_cwd_is_its_parent() {
        let d = tempfile::tempdir().unwrap();
        let file = d.path().join("a.py");
        std::fs::write(&file, "").unwrap();

        let outcome = invoker().run(&file, &sh("t", "echo \"$1\"; pwd -P"));
        let ToolOutcome::Completed(out) = outcome else {
            panic!("expected completion");
        };
        let lines: Vec<&str> = out.stdout.lines().collect();
        assert_eq!(lines[0], file.to_string_lossy());
        let parent = std::fs::canonicalize(d.path()).unwrap();
        assert_eq!(lines[1], parent.to_string_lossy());
    }

    #[test]
    fn missing_executable_is_unavailable() {
        let d = tempfile::tempdir().unwrap();
        let tool = ToolDefinition::checker("ghost", &["codex-no-such-tool-xyz"]);
        let outcome = invoker().run(&d.path().join("a.py"), &tool);
        assert!(matches!(outcome, ToolOutcome::Unavailable { .. }));
        assert_eq!(outcome.exit_code(), ToolOutcome::UNAVAILABLE_CODE);
    }

    #[test]
    fn slow_tool_times_out_and_is_killed() {
        let d = tempfile::tempdir().unwrap();
        let file = d.path().join("a.py");
        std::fs::write(&file, "").unwrap();
        let marker = d.path().join("finished");

        let script = format!("sleep 2; touch '{}'", marker.display());
        let tool = sh("slow", &script).with_timeout(1);

        let start = Instant::now();
        let outcome = invoker().run(&file, &tool);
        assert!(matches!(outcome, ToolOutcome::TimedOut { .. }));
        assert_eq!(outcome.exit_code(), ToolOutcome::TIMEOUT_CODE);
        assert!(start.elapsed() < Duration::from_millis(1900));

        thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists(), "timed-out tool kept running");
    }

    #[test]
    fn background_process_holding_pipes_cannot_outlive_timeout() {
        let d = tempfile::tempdir().unwrap();
        let file = d.path().join("a.py");
        std::fs::write(&file, "").unwrap();

        let tool = sh("daemonizing", "sleep 4 & exit 1").with_timeout(1);
        let start = Instant::now();
        let outcome = invoker().run(&file, &tool);

        assert!(
            matches!(outcome, ToolOutcome::TimedOut { .. }),
            "got {outcome:?}"
        );
        assert!(start.elapsed() < Duration::from_millis(2500));
    }

    #[test]
    fn stragglers_in_the_group_are_killed() {
        let d = tempfile::tempdir().unwrap();
        let file = d.path().join("a.py");
        std::fs::write(&file, "").unwrap();
        let marker = d.path().join("straggler");

        // Detached from the pipes, so the tool itself completes normally.
        let script = format!(
            "(sleep 1; touch '{}') >/dev/null 2>&1 </dev/null & echo done",
            marker.display()
        );
        let outcome = invoker().run(&file, &sh("bg", &script));
        let ToolOutcome::Completed(out) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(out.stdout.trim(), "done");

        thread::sleep(Duration::from_millis(1500));
        assert!(!marker.exists(), "background process survived the tool");
    }

    #[test]
    fn empty_command_is_an_execution_failure() {
        let tool = ToolDefinition {
            name: "empty".into(),
            command: vec![],
            check: true,
            fix: false,
            timeout: None,
        };
        let outcome = invoker().run(Path::new("/tmp/a.py"), &tool);
        assert_eq!(outcome.exit_code(), ToolOutcome::FAILED_CODE);
    }

    #[test]
    fn non_executable_file_is_an_execution_failure() {
        let d = tempfile::tempdir().unwrap();
        let script = d.path().join("not-exec.sh");
        std::fs::write(&script, "#!/bin/sh\nexit 0\n").unwrap();
        let file = d.path().join("a.py");
        std::fs::write(&file, "").unwrap();

        let program = script.to_string_lossy().to_string();
        let tool = ToolDefinition::checker("noexec", &[program.as_str()]);
        let outcome = invoker().run(&file, &tool);
        // which() rejects non-executables, spawn would fail with EACCES
        assert!(matches!(
            outcome,
            ToolOutcome::Unavailable { .. } | ToolOutcome::Failed { .. }
        ));
        assert!(!outcome.succeeded());
    }
}
