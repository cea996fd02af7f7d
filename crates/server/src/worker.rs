//! Background worker pool.
//!
//! Each worker loops: dequeue → mark running → run the notifier → mark
//! succeeded. A worker holds one job at a time, so a job's wait between
//! replies occupies its worker for the whole duration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use slash_relay_core::{Job, JobReport};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{Instrument, error, info, info_span, warn};

use crate::queue::JobQueue;
use crate::services::Notifier;

/// How long one dequeue call waits before re-checking for shutdown.
const POLL_WAIT: Duration = Duration::from_secs(2);

/// Backoff cap exponent for consecutive broker errors (2^6 = 64s).
const MAX_BACKOFF_EXPONENT: u32 = 6;

/// A set of worker tasks sharing one queue.
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl WorkerPool {
    /// Start `concurrency` workers (at least one).
    ///
    /// Each worker dequeues through its own [`JobQueue::worker_handle`] when
    /// the backend provides one.
    #[must_use]
    pub fn spawn(queue: Arc<dyn JobQueue>, notifier: Notifier, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let handles = (0..concurrency)
            .map(|worker_id| {
                let queue = queue.worker_handle().unwrap_or_else(|| Arc::clone(&queue));
                let notifier = notifier.clone();
                let shutdown_rx = shutdown_rx.clone();
                tokio::spawn(
                    run_worker(queue, notifier, shutdown_rx)
                        .instrument(info_span!("worker", worker_id)),
                )
            })
            .collect();

        info!(
            concurrency,
            backend = queue.backend(),
            delay_ms = u64::try_from(notifier.delay().as_millis()).unwrap_or(u64::MAX),
            "Worker pool started"
        );

        Self { handles, shutdown }
    }

    /// Number of workers in the pool.
    #[must_use]
    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Ask workers to stop after the job in hand.
    pub fn shutdown(&self) {
        // send_replace never fails, even with every receiver gone
        self.shutdown.send_replace(true);
    }

    /// Wait for every worker to exit.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Worker task panicked");
            }
        }
        info!("Worker pool stopped");
    }

    /// Signal shutdown and wait for workers to drain.
    pub async fn shutdown_and_join(self) {
        self.shutdown();
        self.join().await;
    }
}

async fn run_worker(
    queue: Arc<dyn JobQueue>,
    notifier: Notifier,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut consecutive_errors: u32 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        // Not raced against shutdown: dropping a BRPOP mid-flight can lose
        // the job it popped.
        match queue.dequeue(POLL_WAIT).await {
            Ok(Some(job)) => {
                consecutive_errors = 0;
                run_job(queue.as_ref(), &notifier, job).await;
            }
            Ok(None) => {
                consecutive_errors = 0;
            }
            Err(e) => {
                consecutive_errors = consecutive_errors.saturating_add(1);
                let backoff_secs = 1u64 << consecutive_errors.min(MAX_BACKOFF_EXPONENT);
                error!(
                    consecutive_errors,
                    backoff_secs,
                    error = %e,
                    "Failed to dequeue job, backing off"
                );

                tokio::select! {
                    () = tokio::time::sleep(Duration::from_secs(backoff_secs)) => {}
                    _ = shutdown.changed() => {}
                }
            }
        }
    }
}

/// Execute one job and record its reports.
///
/// The returned report is always [`slash_relay_core::JobStatus::Succeeded`]:
/// delivery failures and even a panicking notifier are logged, not
/// surfaced.
pub async fn run_job(queue: &dyn JobQueue, notifier: &Notifier, job: Job) -> JobReport {
    let job_id = job.id;
    let started = Instant::now();

    if let Err(e) = queue.store_report(&JobReport::running(job_id)).await {
        warn!(job_id = %job_id, error = %e, "Failed to record running status");
    }

    let task_notifier = notifier.clone();
    let invocation = job.invocation;
    let outcome = match tokio::spawn(async move { task_notifier.notify(&invocation).await }).await
    {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(job_id = %job_id, error = %e, "Notifier task panicked");
            crate::services::NotifyOutcome::default()
        }
    };

    let report = JobReport::succeeded(job_id, outcome.attempted, outcome.failed);
    if let Err(e) = queue.store_report(&report).await {
        warn!(job_id = %job_id, error = %e, "Failed to record job result");
    }

    info!(
        job_id = %job_id,
        attempted = outcome.attempted,
        failed = outcome.failed,
        elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        "Job finished"
    );

    report
}
