//! Background scoring: a bounded task queue feeding a fixed-size worker pool.
//!
//! Backpressure is reject-on-full. Intake reserves a queue slot before it
//! writes anything, so a saturated pool turns into a 503 with no side effects
//! instead of an unbounded backlog.

pub mod extract;
#[cfg(test)]
pub mod fakes;
pub mod task;

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::MAX_WORKER_POOL_SIZE;

pub use task::{Pipeline, PipelineSettings, ScoringTask};

/// Sending half of the scoring queue. Cloned into app state.
#[derive(Clone)]
pub struct ScoringQueue {
    sender: mpsc::Sender<ScoringTask>,
}

/// A reserved place in the queue; sending through it cannot fail.
pub struct QueueSlot<'a> {
    permit: mpsc::Permit<'a, ScoringTask>,
}

impl QueueSlot<'_> {
    pub fn send(self, task: ScoringTask) {
        self.permit.send(task);
    }
}

impl ScoringQueue {
    pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<ScoringTask>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Reserves a slot without waiting. `Full` means the pool is saturated,
    /// `Closed` means the worker pool has shut down.
    pub fn try_reserve(&self) -> Result<QueueSlot<'_>, mpsc::error::TrySendError<()>> {
        self.sender
            .try_reserve()
            .map(|permit| QueueSlot { permit })
    }
}

pub struct WorkerPool;

impl WorkerPool {
    /// Starts the dispatcher. It runs until every `ScoringQueue` clone is
    /// dropped, then drains the queue and waits for in-flight tasks.
    pub fn spawn(
        receiver: mpsc::Receiver<ScoringTask>,
        pipeline: Arc<Pipeline>,
        max_workers: usize,
    ) -> JoinHandle<()> {
        tokio::spawn(Self::dispatch(receiver, pipeline, max_workers))
    }

    async fn dispatch(
        mut receiver: mpsc::Receiver<ScoringTask>,
        pipeline: Arc<Pipeline>,
        max_workers: usize,
    ) {
        let max_workers = max_workers.clamp(1, MAX_WORKER_POOL_SIZE);
        info!(max_workers, "Scoring worker pool started");
        let semaphore = Arc::new(Semaphore::new(max_workers));

        loop {
            // Take a worker slot before pulling the next task so that a busy
            // pool leaves work in the queue, where intake can see it is full.
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let Some(task) = receiver.recv().await else {
                break;
            };

            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                let application_id = task.application_id;
                let worker = tokio::spawn({
                    let pipeline = pipeline.clone();
                    async move { pipeline.run(task).await }
                });
                if let Err(e) = worker.await {
                    error!(%application_id, error = %e, "Scoring worker aborted");
                    pipeline
                        .record_failure(application_id, "worker aborted unexpectedly")
                        .await;
                }
                drop(permit);
            });
        }

        // Every slot free again means every in-flight task has finished.
        let _ = semaphore.acquire_many(max_workers as u32).await;
        info!("Scoring worker pool stopped");
    }
}
