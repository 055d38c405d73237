use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use super::worker::{self, ImageTask, TaskAction, TaskResult};

/// Shared cancellation flag. Workers check it before starting a task;
/// in-flight tasks run to completion (writes are atomic either way, so a
/// partial output can never be observed).
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Aggregate progress counters. Owned and mutated only by the coordinator
/// thread; snapshots travel with each emitted result.
#[derive(Debug, Clone, Copy)]
pub struct BatchState {
    pub total: usize,
    pub completed: usize,
}

impl BatchState {
    /// Completion fraction in 0.0..=1.0. An empty batch is complete.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Final tallies carried by the terminal event.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub total: usize,
    pub completed: usize,
    pub resized: usize,
    pub copied: usize,
    pub skipped: usize,
    pub errored: usize,
    pub duration: Duration,
}

/// Event stream emitted by a running batch, in completion order (not
/// submission order). Exactly one terminal event closes the stream.
#[derive(Debug)]
pub enum BatchEvent {
    Result {
        result: TaskResult,
        state: BatchState,
    },
    Completed(BatchSummary),
    Cancelled(BatchSummary),
}

/// Lazy, finite sequence of batch events. Iteration blocks until the next
/// task completes; the iterator ends after the terminal event.
pub struct BatchStream {
    events: mpsc::Receiver<BatchEvent>,
    cancel: CancelToken,
}

impl BatchStream {
    /// Token for requesting cooperative cancellation of this run.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }
}

impl Iterator for BatchStream {
    type Item = BatchEvent;

    fn next(&mut self) -> Option<BatchEvent> {
        self.events.recv().ok()
    }
}

/// Owns the worker pool and the dispatch/aggregation loop.
pub struct BatchCoordinator {
    worker_count: usize,
    cancel: CancelToken,
}

impl BatchCoordinator {
    /// `worker_count` of 0 auto-detects the number of CPU cores.
    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            cancel: CancelToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Start the batch and return its event stream.
    ///
    /// Setup failures (output root cannot be created, pool cannot be built)
    /// abort here, before any task is dispatched. Per-task failures never
    /// do: they surface as `TaskResult`s in the stream.
    pub fn run(&self, tasks: Vec<ImageTask>) -> Result<BatchStream> {
        let output_roots: BTreeSet<PathBuf> =
            tasks.iter().map(|t| t.output_root.clone()).collect();
        for root in &output_roots {
            fs::create_dir_all(root).with_context(|| {
                format!("Failed to create output root: {}", root.display())
            })?;
        }

        let total = tasks.len();
        let worker_count = effective_worker_count(self.worker_count, total);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(worker_count)
            .build()
            .context("Failed to initialize worker pool")?;

        let (done_tx, done_rx) = mpsc::channel::<TaskResult>();
        for task in tasks {
            let done_tx = done_tx.clone();
            let cancel = self.cancel.clone();
            pool.spawn(move || {
                // Cancellation stops dispatch: a task that has not started
                // yet is dropped without touching the filesystem
                if cancel.is_cancelled() {
                    return;
                }
                let _ = done_tx.send(worker::process(&task));
            });
        }
        drop(done_tx);

        let (event_tx, event_rx) = mpsc::channel();
        let cancel = self.cancel.clone();
        thread::spawn(move || {
            let started = Instant::now();
            let mut state = BatchState {
                total,
                completed: 0,
            };
            let mut resized = 0usize;
            let mut copied = 0usize;
            let mut skipped = 0usize;
            let mut errored = 0usize;

            for result in done_rx {
                state.completed += 1;
                match result.action {
                    TaskAction::Upscaled | TaskAction::Downscaled => resized += 1,
                    TaskAction::Copied => copied += 1,
                    TaskAction::Skipped => skipped += 1,
                    TaskAction::Errored => errored += 1,
                }
                // A dropped receiver just stops emission; workers drain
                // through the unbounded channel regardless
                let _ = event_tx.send(BatchEvent::Result { result, state });
            }

            let summary = BatchSummary {
                total,
                completed: state.completed,
                resized,
                copied,
                skipped,
                errored,
                duration: started.elapsed(),
            };
            let terminal = if cancel.is_cancelled() {
                BatchEvent::Cancelled(summary)
            } else {
                BatchEvent::Completed(summary)
            };
            let _ = event_tx.send(terminal);

            // Keep the pool alive until every spawned task has run or been
            // skipped; done_rx only closes once all senders are gone
            drop(pool);
        });

        Ok(BatchStream {
            events: event_rx,
            cancel: self.cancel.clone(),
        })
    }
}

/// Default to the number of CPU cores, capped at the task count; always at
/// least one slot so pool construction cannot degenerate.
fn effective_worker_count(requested: usize, task_count: usize) -> usize {
    let requested = if requested == 0 {
        num_cpus::get()
    } else {
        requested
    };
    requested.min(task_count).max(1)
}
