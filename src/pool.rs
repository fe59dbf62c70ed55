//! Bounded parallel dispatch with results streamed in completion order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;

use rayon::iter::{ParallelBridge, ParallelIterator};
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::{CodexError, Result};
use crate::signal::CancelToken;

/// Everything a pool run produced.
#[derive(Debug)]
pub struct PoolOutcome<R> {
    /// Results in completion order.
    pub results: Vec<R>,
    /// Dispatch stopped early because the token was cancelled.
    pub cancelled: bool,
}

/// A fixed-size set of workers dedicated to one run.
pub struct WorkerPool {
    pool: ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// # Errors
    /// Returns error if the OS refuses to spawn the worker threads.
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("codex-worker-{i}"))
            .build()?;
        Ok(Self { pool, workers })
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs `process` over `tasks` with at most `workers` in flight.
    ///
    /// `tasks` is pulled lazily, so a scanner can feed the pool while it is
    /// still walking. `on_result` runs on the calling thread as each task
    /// completes. A panicking task is turned into a result by `recover`.
    ///
    /// Cancellation is checked before each task starts: once `cancel` trips,
    /// no new task is dispatched, but tasks already running finish and
    /// their results are still delivered.
    ///
    /// # Errors
    /// Returns error if the dispatcher thread itself dies.
    pub fn run<I, T, R, F, P, C>(
        &self,
        tasks: I,
        cancel: &CancelToken,
        process: F,
        recover: P,
        mut on_result: C,
    ) -> Result<PoolOutcome<R>>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send,
        T: Send,
        R: Send,
        F: Fn(&T) -> R + Sync,
        P: Fn(&T, String) -> R + Sync,
        C: FnMut(&R),
    {
        let tasks = tasks.into_iter();
        let (tx, rx) = mpsc::channel::<R>();
        let mut results = Vec::new();

        let dispatched = thread::scope(|s| {
            let dispatcher = s.spawn(|| {
                self.pool.install(|| {
                    tasks
                        .par_bridge()
                        .try_for_each_with(tx, |tx, task| {
                            if cancel.is_cancelled() {
                                return Err(());
                            }
                            let result = panic::catch_unwind(AssertUnwindSafe(|| process(&task)))
                                .unwrap_or_else(|payload| recover(&task, panic_message(&*payload)));
                            tx.send(result).map_err(|_| ())
                        })
                })
            });

            // Ends once every sender clone is dropped, i.e. dispatch is over.
            for result in rx {
                on_result(&result);
                results.push(result);
            }
            dispatcher.join()
        });

        let stopped_early = dispatched
            .map_err(|payload| CodexError::Pool(panic_message(&*payload)))?
            .is_err();
        let cancelled = stopped_early || cancel.is_cancelled();
        debug!(completed = results.len(), cancelled, "pool drained");

        Ok(PoolOutcome { results, cancelled })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
