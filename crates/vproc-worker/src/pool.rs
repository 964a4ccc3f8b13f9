//! Worker pool supervisor.
//!
//! Starts N identical worker loops over one shared [`JobExecutor`] and stops
//! them with a bounded wait.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::executor::JobExecutor;

/// Lifecycle of a worker loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    Running,
    Stopping,
}

/// Snapshot of one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerState {
    pub id: usize,
    pub status: WorkerStatus,
}

/// How a stop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every worker exited within the grace period
    Drained,
    /// The grace period elapsed; this many workers were still busy
    TimedOut { abandoned: usize },
}

/// A fixed set of worker loops sharing one executor.
pub struct WorkerPool {
    executor: Arc<JobExecutor>,
    shutdown: CancellationToken,
    claim_backoff: Duration,
    workers: Vec<(usize, JoinHandle<()>)>,
}

impl WorkerPool {
    pub fn new(executor: Arc<JobExecutor>, claim_backoff: Duration) -> Self {
        Self {
            executor,
            shutdown: CancellationToken::new(),
            claim_backoff,
            workers: Vec::new(),
        }
    }

    /// Spawn `count` worker loops, numbered from 1.
    ///
    /// At most `count` jobs run at once, one per loop.
    pub fn start(&mut self, count: usize) {
        let first = self.workers.len() + 1;
        for worker_id in first..first + count {
            let handle = tokio::spawn(worker_loop(
                worker_id,
                Arc::clone(&self.executor),
                self.shutdown.clone(),
                self.claim_backoff,
            ));
            self.workers.push((worker_id, handle));
        }
        info!(count, total = self.workers.len(), "Workers started");
    }

    /// Token fired when the pool is told to stop.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Current state of each worker loop.
    pub fn states(&self) -> Vec<WorkerState> {
        self.workers
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .map(|(id, _)| WorkerState {
                id: *id,
                status: if self.shutdown.is_cancelled() {
                    WorkerStatus::Stopping
                } else {
                    WorkerStatus::Running
                },
            })
            .collect()
    }

    /// Stop claiming new jobs. Idempotent.
    pub fn signal_stop(&self) {
        self.shutdown.cancel();
    }

    /// Stop the pool, waiting at most `grace` for in-flight jobs.
    ///
    /// Workers still busy when the grace period ends are left running and
    /// reported as abandoned; their jobs are not acknowledged.
    pub async fn stop(mut self, grace: Duration) -> ShutdownOutcome {
        self.signal_stop();
        info!(
            workers = ?self.states(),
            grace_secs = grace.as_secs_f64(),
            "Stopping workers"
        );

        let drained = tokio::time::timeout(
            grace,
            join_all(self.workers.iter_mut().map(|(_, handle)| handle)),
        )
        .await
        .is_ok();

        if drained {
            info!("All workers stopped");
            return ShutdownOutcome::Drained;
        }

        let abandoned = self
            .workers
            .iter()
            .filter(|(_, handle)| !handle.is_finished())
            .count();
        warn!(abandoned, "Shutdown grace period elapsed with jobs in flight");
        ShutdownOutcome::TimedOut { abandoned }
    }
}

async fn worker_loop(
    worker_id: usize,
    executor: Arc<JobExecutor>,
    shutdown: CancellationToken,
    claim_backoff: Duration,
) {
    debug!(worker_id, "Worker started");

    while !shutdown.is_cancelled() {
        match executor.claim_and_run(worker_id, &shutdown).await {
            Ok(_) => {}
            Err(e) if e.is_claim_failure() => {
                warn!(worker_id, "Claim failed: {}", e);
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(claim_backoff) => {}
                }
            }
            // Already logged with its phase by the executor.
            Err(_) => {}
        }
    }

    debug!(worker_id, "Worker stopped");
}
