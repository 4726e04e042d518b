//! Bounded worker pool for pipeline work units.
//!
//! Every pipeline stage partitions its work into one [`WorkUnit`] per input
//! file and hands the batch to a [`WorkerPool`]. The pool caps how many
//! external processes run at once: unpacking defaults to twice the logical
//! CPU count, while conversion is forced down to a single worker because the
//! converter does not tolerate parallel invocation reliably.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::task::JoinSet;

/// A single unit of pipeline work.
///
/// Opaque to the pool: everything the unit touches (paths, tool handles) is
/// captured at creation time. Each unit is executed exactly once.
pub type WorkUnit = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Default worker count: twice the logical CPU count. Extraction is
/// process-spawn-bound, not compute-bound, so oversubscribing cores keeps the
/// tools busy while the runtime waits on exits.
pub fn default_concurrency() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus * 2
}

/// Executes a queue of independent work units with a fixed number of
/// concurrent workers.
///
/// Workers pop from a shared queue, so at most `concurrency` units are in
/// flight at any instant. The first failing unit makes the pool's overall
/// result an error and raises a shared abort flag; workers check the flag
/// before each dequeue, so queued units are never started after a failure
/// while in-flight units (and their external processes) drain to completion.
///
/// Progress is reported in deciles: after every `total / 10` completions a
/// percentage milestone is logged. Batches smaller than ten units skip
/// milestone reporting entirely.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    concurrency: usize,
}

impl WorkerPool {
    /// Pool with the default worker count.
    pub fn new() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }

    /// Pool with an explicit worker count (clamped to at least one). Pass 1
    /// for stages whose tool requires single-flight execution.
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every unit to completion.
    ///
    /// Resolves once all workers have observed an empty queue (or the abort
    /// flag) and every in-flight unit has settled. Returns the first unit
    /// failure, if any.
    pub async fn run(&self, units: Vec<WorkUnit>) -> Result<()> {
        let total = units.len();
        if total == 0 {
            return Ok(());
        }

        // Milestone interval is zero for batches under ten units, which
        // disables percentage reporting instead of taking a modulus by zero.
        let milestone = total / 10;

        let queue = Arc::new(Mutex::new(VecDeque::from(units)));
        let completed = Arc::new(AtomicUsize::new(0));
        let aborted = Arc::new(AtomicBool::new(false));

        let mut workers: JoinSet<Result<()>> = JoinSet::new();
        for _ in 0..self.concurrency {
            let queue = Arc::clone(&queue);
            let completed = Arc::clone(&completed);
            let aborted = Arc::clone(&aborted);

            workers.spawn(async move {
                loop {
                    if aborted.load(Ordering::SeqCst) {
                        break;
                    }

                    // Pop under the lock, execute outside it.
                    let unit = queue.lock().unwrap().pop_front();
                    let Some(unit) = unit else { break };

                    if let Err(err) = unit.await {
                        aborted.store(true, Ordering::SeqCst);
                        return Err(err);
                    }

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if milestone > 0 && done % milestone == 0 {
                        let percent = (done / milestone) * 10;
                        if percent <= 100 {
                            tracing::info!("{}%", percent);
                        }
                    }
                }
                Ok(())
            });
        }

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined.context("Worker task panicked")? {
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_concurrency_is_positive_and_doubled() {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(default_concurrency(), cpus * 2);
    }

    #[test]
    fn test_concurrency_clamped_to_one() {
        assert_eq!(WorkerPool::with_concurrency(0).concurrency(), 1);
        assert_eq!(WorkerPool::with_concurrency(3).concurrency(), 3);
    }

    #[test]
    fn test_empty_batch_resolves() {
        let pool = WorkerPool::with_concurrency(4);
        tokio_test::block_on(pool.run(Vec::new())).unwrap();
    }

    #[test]
    fn test_more_workers_than_units() {
        let executed = Arc::new(AtomicUsize::new(0));
        let units: Vec<WorkUnit> = (0..3)
            .map(|_| {
                let executed = Arc::clone(&executed);
                Box::pin(async move {
                    executed.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }) as WorkUnit
            })
            .collect();

        let pool = WorkerPool::with_concurrency(16);
        tokio_test::block_on(pool.run(units)).unwrap();
        assert_eq!(executed.load(Ordering::SeqCst), 3);
    }
}
