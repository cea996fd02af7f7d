//! Jobs and job reports.
//!
//! A [`Job`] is the envelope that crosses the broker; a [`JobReport`] is what
//! workers write to the result store while and after running it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CommandInvocation, JobStatus};

/// Identifier of an enqueued job.
///
/// Every enqueue mints a fresh id, so replaying the same webhook yields two
/// distinct jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a new random job ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for JobId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<JobId> for Uuid {
    fn from(id: JobId) -> Self {
        id.0
    }
}

/// A unit of deferred work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier.
    pub id: JobId,
    /// The invocation the worker acts on.
    pub invocation: CommandInvocation,
    /// When the receiver handed the job to the broker.
    pub enqueued_at: DateTime<Utc>,
}

impl Job {
    /// Wrap an invocation in a new job with a fresh id.
    #[must_use]
    pub fn new(invocation: CommandInvocation) -> Self {
        Self {
            id: JobId::new(),
            invocation,
            enqueued_at: Utc::now(),
        }
    }
}

/// Result-store record for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: JobId,
    pub status: JobStatus,
    /// Callback POSTs attempted so far.
    pub deliveries_attempted: u32,
    /// Callback POSTs that failed. Never affects `status`.
    pub deliveries_failed: u32,
    pub updated_at: DateTime<Utc>,
}

impl JobReport {
    /// Report for a job that has been accepted but not started.
    #[must_use]
    pub fn queued(job_id: JobId) -> Self {
        Self::with_status(job_id, JobStatus::Queued)
    }

    /// Report for a job a worker has just picked up.
    #[must_use]
    pub fn running(job_id: JobId) -> Self {
        Self::with_status(job_id, JobStatus::Running)
    }

    /// Report for a finished job.
    #[must_use]
    pub fn succeeded(job_id: JobId, deliveries_attempted: u32, deliveries_failed: u32) -> Self {
        Self {
            job_id,
            status: JobStatus::Succeeded,
            deliveries_attempted,
            deliveries_failed,
            updated_at: Utc::now(),
        }
    }

    fn with_status(job_id: JobId, status: JobStatus) -> Self {
        Self {
            job_id,
            status,
            deliveries_attempted: 0,
            deliveries_failed: 0,
            updated_at: Utc::now(),
        }
    }
}
