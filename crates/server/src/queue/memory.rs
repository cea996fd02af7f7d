//! In-process job queue.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use slash_relay_core::{Job, JobId, JobReport};
use tokio::sync::Notify;
use tracing::debug;

use super::{JobQueue, QueueError};

/// FIFO queue and report map living in this process.
///
/// Jobs are lost on restart and invisible to other processes, so this only
/// backs a server that runs its own workers.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    jobs: Mutex<VecDeque<Job>>,
    reports: Mutex<HashMap<JobId, JobReport>>,
    available: Notify,
    closed: AtomicBool,
}

impl MemoryQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs waiting for a worker.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.jobs).len()
    }

    /// Whether no jobs are waiting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.jobs).is_empty()
    }

    /// Snapshot of waiting jobs, oldest first.
    #[must_use]
    pub fn pending(&self) -> Vec<Job> {
        lock(&self.jobs).iter().cloned().collect()
    }

    /// Stop accepting jobs. Jobs already queued can still be taken.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.available.notify_waiters();
    }

    fn pop(&self) -> Option<Job> {
        lock(&self.jobs).pop_front()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn enqueue(&self, job: &Job) -> Result<(), QueueError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(QueueError::Closed);
        }

        lock(&self.reports).insert(job.id, JobReport::queued(job.id));
        lock(&self.jobs).push_back(job.clone());
        self.available.notify_one();

        debug!(job_id = %job.id, "Job queued in memory");
        Ok(())
    }

    async fn dequeue(&self, wait: Duration) -> Result<Option<Job>, QueueError> {
        let deadline = tokio::time::Instant::now() + wait;

        loop {
            if let Some(job) = self.pop() {
                return Ok(Some(job));
            }
            if self.closed.load(Ordering::SeqCst) {
                // Nothing can arrive; still honor the wait so pollers don't spin
                tokio::time::sleep_until(deadline).await;
                return Ok(self.pop());
            }
            // notify_one leaves a permit when nobody is waiting, so an
            // enqueue between pop() and here is not missed
            if tokio::time::timeout_at(deadline, self.available.notified())
                .await
                .is_err()
            {
                return Ok(self.pop());
            }
        }
    }

    async fn store_report(&self, report: &JobReport) -> Result<(), QueueError> {
        lock(&self.reports).insert(report.job_id, report.clone());
        Ok(())
    }

    async fn report(&self, job_id: JobId) -> Result<Option<JobReport>, QueueError> {
        Ok(lock(&self.reports).get(&job_id).cloned())
    }

    async fn is_ready(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Lock ignoring poisoning; every critical section here is a single
/// collection operation that cannot leave the data half-updated.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
