//! Redis-backed job queue.
//!
//! Layout:
//! - Jobs are JSON strings in the list `QUEUE_KEY` (LPUSH to enqueue, BRPOP
//!   to consume, so each list is FIFO).
//! - Reports are JSON strings at `slash_relay:job:{id}` with a TTL.
//!
//! BRPOP holds its connection until it returns, so it never runs on the
//! connection used for LPUSH/SET/GET. Each worker gets its own blocking
//! connection through [`JobQueue::worker_handle`].
//!
//! BRPOP removes the job before it runs; a worker that dies mid-job loses it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use fred::interfaces::{KeysInterface, ListInterface};
use fred::prelude::*;
use slash_relay_core::{Job, JobId, JobReport};
use tracing::{debug, error, info, instrument, warn};

use super::{JobQueue, QueueError};

/// Redis list holding pending jobs.
const QUEUE_KEY: &str = "slash_relay:jobs";

/// Prefix for job report keys.
const REPORT_KEY_PREFIX: &str = "slash_relay:job:";

/// Default lifetime of a job report.
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Job queue on a shared Redis instance.
#[derive(Clone)]
pub struct RedisQueue {
    /// LPUSH, SET, GET and DEL. Never blocks.
    client: Client,
    /// BRPOP only.
    blocking: Client,
    result_ttl: Duration,
}

impl std::fmt::Debug for RedisQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisQueue")
            .field("queue_key", &QUEUE_KEY)
            .field("result_ttl", &self.result_ttl)
            .finish_non_exhaustive()
    }
}

impl RedisQueue {
    /// Connect to Redis and wait for both connections to come up.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid or the connection fails.
    pub async fn connect(redis_url: &str, result_ttl: Duration) -> Result<Self, QueueError> {
        let config = Config::from_url(redis_url)?;
        let client = Client::new(config, None, None, None);
        client.connect();
        client.wait_for_connect().await?;

        let blocking = client.clone_new();
        blocking.connect();
        blocking.wait_for_connect().await?;

        info!("Connected to Redis");
        Ok(Self {
            client,
            blocking,
            result_ttl,
        })
    }

    /// Close both connections.
    ///
    /// # Errors
    ///
    /// Returns error if QUIT fails.
    pub async fn quit(&self) -> Result<(), QueueError> {
        self.blocking.quit().await?;
        self.client.quit().await?;
        Ok(())
    }

    fn ttl_secs(&self) -> i64 {
        i64::try_from(self.result_ttl.as_secs())
            .unwrap_or(i64::MAX)
            .max(1)
    }
}

/// Key under which a job's report is stored.
fn report_key(job_id: JobId) -> String {
    format!("{REPORT_KEY_PREFIX}{job_id}")
}

#[async_trait]
impl JobQueue for RedisQueue {
    #[instrument(skip(self, job), fields(job_id = %job.id))]
    async fn enqueue(&self, job: &Job) -> Result<(), QueueError> {
        let payload = serde_json::to_string(job)?;

        self.store_report(&JobReport::queued(job.id)).await?;

        if let Err(e) = self.client.lpush::<(), _, _>(QUEUE_KEY, payload).await {
            // The job never reached the list, so its queued report would never move
            if let Err(del_err) = self.client.del::<(), _>(report_key(job.id)).await {
                warn!(error = %del_err, "Failed to remove report of unqueued job");
            }
            return Err(e.into());
        }

        debug!("Job pushed to Redis");
        Ok(())
    }

    async fn dequeue(&self, wait: Duration) -> Result<Option<Job>, QueueError> {
        // BRPOP treats 0 as "block forever"
        let timeout = wait.as_secs_f64().max(0.01);
        let popped: Option<(String, String)> = self.blocking.brpop(QUEUE_KEY, timeout).await?;

        let Some((_key, payload)) = popped else {
            return Ok(None);
        };

        match serde_json::from_str::<Job>(&payload) {
            Ok(job) => Ok(Some(job)),
            Err(e) => {
                let truncated: String = payload.chars().take(500).collect();
                error!(
                    error = %e,
                    payload_preview = %truncated,
                    "Discarding undecodable job payload"
                );
                Ok(None)
            }
        }
    }

    async fn store_report(&self, report: &JobReport) -> Result<(), QueueError> {
        let payload = serde_json::to_string(report)?;
        self.client
            .set::<(), _, _>(
                report_key(report.job_id),
                payload,
                Some(Expiration::EX(self.ttl_secs())),
                None,
                false,
            )
            .await?;
        Ok(())
    }

    async fn report(&self, job_id: JobId) -> Result<Option<JobReport>, QueueError> {
        let payload: Option<String> = self.client.get(report_key(job_id)).await?;
        payload
            .map(|p| serde_json::from_str(&p))
            .transpose()
            .map_err(QueueError::from)
    }

    async fn is_ready(&self) -> bool {
        self.client.is_connected()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }

    fn worker_handle(&self) -> Option<Arc<dyn JobQueue>> {
        // Commands issued before the connection is up are buffered by fred
        let blocking = self.blocking.clone_new();
        blocking.connect();

        Some(Arc::new(Self {
            client: self.client.clone(),
            blocking,
            result_ttl: self.result_ttl,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Instant;

    use slash_relay_core::{CallbackUrl, CommandInvocation, JobStatus};

    use super::*;
    use crate::queue::resp_stub::RespStub;

    fn job(text: &str) -> Job {
        Job::new(CommandInvocation::new(
            "/insights",
            text,
            "C1",
            CallbackUrl::parse("https://example.com/r").unwrap(),
        ))
    }

    async fn queue_on(stub: &RespStub, ttl: Duration) -> RedisQueue {
        RedisQueue::connect(&stub.url(), ttl).await.unwrap()
    }

    #[test]
    fn test_report_key() {
        let id: JobId = "6f1c2a9e-3b7d-4c55-9a0e-2f4b8d1e7c30".parse().unwrap();
        assert_eq!(
            report_key(id),
            "slash_relay:job:6f1c2a9e-3b7d-4c55-9a0e-2f4b8d1e7c30"
        );
    }

    #[test]
    fn test_default_result_ttl_is_one_day() {
        assert_eq!(DEFAULT_RESULT_TTL.as_secs(), 86_400);
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let stub = RespStub::start().await;
        let queue = queue_on(&stub, DEFAULT_RESULT_TTL).await;
        let (first, second) = (job("first"), job("second"));

        queue.enqueue(&first).await.unwrap();
        queue.enqueue(&second).await.unwrap();

        let a = queue.dequeue(Duration::from_secs(1)).await.unwrap().unwrap();
        let b = queue.dequeue(Duration::from_secs(1)).await.unwrap().unwrap();
        assert_eq!(a, first);
        assert_eq!(b, second);
        assert!(queue.dequeue(Duration::from_millis(50)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reports_carry_ttl_and_decode() {
        let stub = RespStub::start().await;
        let queue = queue_on(&stub, Duration::from_secs(600)).await;
        let job = job("ttl");

        queue.enqueue(&job).await.unwrap();
        let key = report_key(job.id);
        assert_eq!(stub.ttl(&key), Some(600));
        assert_eq!(
            queue.report(job.id).await.unwrap().unwrap().status,
            JobStatus::Queued
        );

        let done = JobReport::succeeded(job.id, 2, 1);
        queue.store_report(&done).await.unwrap();
        assert_eq!(queue.report(job.id).await.unwrap(), Some(done));
        assert_eq!(stub.ttl(&key), Some(600));

        assert!(queue.report(JobId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_skipped() {
        let stub = RespStub::start().await;
        let queue = queue_on(&stub, DEFAULT_RESULT_TTL).await;
        let good = job("good");

        queue
            .client
            .lpush::<(), _, _>(QUEUE_KEY, "{not a job")
            .await
            .unwrap();
        queue.enqueue(&good).await.unwrap();

        assert!(queue.dequeue(Duration::from_secs(1)).await.unwrap().is_none());
        assert_eq!(
            queue.dequeue(Duration::from_secs(1)).await.unwrap(),
            Some(good)
        );
    }

    #[tokio::test]
    async fn test_failed_push_removes_queued_report() {
        let stub = RespStub::start().await;
        let queue = queue_on(&stub, DEFAULT_RESULT_TTL).await;
        let job = job("lost");

        stub.fail_lpush(true);
        assert!(queue.enqueue(&job).await.is_err());
        assert!(queue.report(job.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_idle_workers_do_not_delay_enqueue() {
        let stub = RespStub::start().await;
        let queue = queue_on(&stub, DEFAULT_RESULT_TTL).await;

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let handle = queue.worker_handle().unwrap();
                tokio::spawn(async move { handle.dequeue(Duration::from_secs(2)).await })
            })
            .collect();
        // The server's own handle may be blocked too
        let own = {
            let queue = queue.clone();
            tokio::spawn(async move { queue.dequeue(Duration::from_secs(2)).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = Instant::now();
        queue.enqueue(&job("urgent")).await.unwrap();
        queue.store_report(&JobReport::running(JobId::new())).await.unwrap();
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "enqueue waited {:?} behind blocked dequeues",
            started.elapsed()
        );

        let mut received = 0;
        for waiter in waiters {
            if waiter.await.unwrap().unwrap().is_some() {
                received += 1;
            }
        }
        if own.await.unwrap().unwrap().is_some() {
            received += 1;
        }
        assert_eq!(received, 1);
    }

    // Requires a local Redis: cargo test -p slash-relay-server -- --ignored
    #[tokio::test]
    #[ignore = "requires Redis on localhost:6379"]
    async fn test_round_trip_through_redis() {
        let queue = RedisQueue::connect("redis://localhost:6379", Duration::from_secs(60))
            .await
            .unwrap();
        let job = job("redis");

        queue.enqueue(&job).await.unwrap();
        let report = queue.report(job.id).await.unwrap().unwrap();
        assert_eq!(report.status, JobStatus::Queued);

        let received = queue.dequeue(Duration::from_secs(1)).await.unwrap().unwrap();
        assert_eq!(received, job);
    }
}
