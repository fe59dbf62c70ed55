// src/engine.rs
//! Orchestrates one run: scan, dispatch to the pool, summarize.

use std::path::Path;

use tracing::{info, warn};

use crate::config::Config;
use crate::discovery;
use crate::error::Result;
use crate::events::{EventKind, EventLogger};
use crate::fix::{remove_orphaned_backups, FileLockRegistry};
use crate::pipeline::AnalysisPipeline;
use crate::pool::WorkerPool;
use crate::signal::CancelToken;
use crate::tools::ToolInvoker;
use crate::types::{AnalysisResult, FileTask, RunSummary};

/// Everything one run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Per-file results in completion order.
    pub results: Vec<AnalysisResult>,
    pub summary: RunSummary,
    /// The run was cancelled before every file was dispatched.
    pub interrupted: bool,
    /// Directory entries the walk could not read.
    pub unreadable: usize,
}

/// Holds the run-scoped shared state: configuration, tool invoker and
/// the per-file lock registry.
pub struct Engine {
    config: Config,
    invoker: ToolInvoker,
    locks: FileLockRegistry,
    events: Option<EventLogger>,
}

impl Engine {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let invoker = ToolInvoker::new(config.settings.default_timeout());
        Self {
            config,
            invoker,
            locks: FileLockRegistry::new(),
            events: None,
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: EventLogger) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn pipeline(&self) -> AnalysisPipeline<'_> {
        let pipeline = AnalysisPipeline::new(&self.config, &self.invoker, &self.locks);
        match &self.events {
            Some(events) => pipeline.with_events(events),
            None => pipeline,
        }
    }

    /// Processes a single file outside of a pool.
    #[must_use]
    pub fn process_file(&self, task: &FileTask) -> AnalysisResult {
        self.pipeline().process(task)
    }

    /// Scans `root` and processes every file, without progress callbacks
    /// or cancellation.
    ///
    /// # Errors
    /// Returns error if `root` is not a directory or the pool cannot start.
    pub fn scan_and_process(&self, root: &Path) -> Result<Vec<AnalysisResult>> {
        Ok(self.run(root, &CancelToken::new(), |_| {})?.results)
    }

    /// Full run over `root`. `on_result` sees each result as it completes.
    ///
    /// # Errors
    /// Returns error if `root` is not a directory or the pool cannot start.
    pub fn run<C>(&self, root: &Path, cancel: &CancelToken, on_result: C) -> Result<RunOutcome>
    where
        C: FnMut(&AnalysisResult),
    {
        let settings = &self.config.settings;
        let scan = discovery::scan(root, &settings.skip_dirs)?;
        let pool = WorkerPool::new(settings.max_workers)?;

        info!(root = %scan.root().display(), workers = pool.workers(), fix = settings.fix_mode, "run started");
        self.log(EventKind::RunStarted {
            root: scan.root().display().to_string(),
            fix_mode: settings.fix_mode,
            workers: pool.workers(),
        });

        let stats = scan.stats();
        let pipeline = self.pipeline();
        let outcome = pool.run(
            scan,
            cancel,
            |task| pipeline.process(task),
            |task, msg| {
                AnalysisResult::from_parts(task, vec![format!("Internal error: {msg}")], Vec::new(), false)
            },
            on_result,
        )?;

        if stats.errors() > 0 {
            warn!(
                root = %root.display(),
                unreadable = stats.errors(),
                "some entries could not be read and were skipped"
            );
        }
        info!(visited = stats.visited(), unreadable = stats.errors(), "scan finished");

        let summary = RunSummary::now(&outcome.results);
        if outcome.cancelled {
            self.log(EventKind::RunInterrupted {
                completed: outcome.results.len(),
            });
        } else {
            self.log(EventKind::RunFinished {
                total: summary.total_files,
                passed: summary.passed,
                failed: summary.failed,
                fixed: summary.fixed,
            });
        }

        Ok(RunOutcome {
            results: outcome.results,
            summary,
            interrupted: outcome.cancelled,
            unreadable: stats.errors(),
        })
    }

    /// Removes leftover backup artifacts under `root`.
    ///
    /// # Errors
    /// Returns error if `root` does not exist.
    pub fn sweep_backups(&self, root: &Path) -> Result<usize> {
        let removed = remove_orphaned_backups(root)?;
        if removed > 0 {
            self.log(EventKind::BackupsSwept {
                root: root.display().to_string(),
                removed,
            });
        }
        Ok(removed)
    }

    fn log(&self, kind: EventKind) {
        if let Some(events) = &self.events {
            events.log(kind);
        }
    }
}
