//! Job queue and result store.
//!
//! The receiver enqueues, workers dequeue, and both sides write
//! [`JobReport`]s. Two backends implement [`JobQueue`]:
//!
//! - [`RedisQueue`] - shared broker for a separate worker process
//! - [`MemoryQueue`] - in-process queue for local development and tests
//!
//! Neither deduplicates: every enqueue is a new job.

mod error;
mod memory;
mod redis;
#[cfg(test)]
mod resp_stub;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use slash_relay_core::{Job, JobId, JobReport};

pub use error::QueueError;
pub use memory::MemoryQueue;
pub use redis::{DEFAULT_RESULT_TTL, RedisQueue};

/// A broker plus result store for deferred jobs.
#[async_trait]
pub trait JobQueue: Send + Sync + 'static {
    /// Hand a job to the broker.
    ///
    /// Records a queued [`JobReport`] before the job becomes visible to
    /// workers, so a worker's report always overwrites it and never the
    /// other way round.
    async fn enqueue(&self, job: &Job) -> Result<(), QueueError>;

    /// Take the next job, waiting up to `wait` for one to arrive.
    ///
    /// Returns `Ok(None)` when nothing arrived in time.
    async fn dequeue(&self, wait: Duration) -> Result<Option<Job>, QueueError>;

    /// Write a job report to the result store.
    async fn store_report(&self, report: &JobReport) -> Result<(), QueueError>;

    /// Read a job report from the result store.
    async fn report(&self, job_id: JobId) -> Result<Option<JobReport>, QueueError>;

    /// Whether the backend is currently usable.
    async fn is_ready(&self) -> bool;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// A handle for one worker, when workers must not share this one.
    ///
    /// Backends whose `dequeue` ties up a connection return a handle with
    /// its own; `None` means the worker can use this queue directly.
    fn worker_handle(&self) -> Option<Arc<dyn JobQueue>> {
        None
    }
}
