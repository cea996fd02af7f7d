//! Job lifecycle status.

use serde::{Deserialize, Serialize};

/// Where a job is in its lifecycle, as recorded in the result store.
///
/// There is no failed state: callback delivery failures are logged and the
/// job still finishes as [`JobStatus::Succeeded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the broker, not yet picked up.
    #[default]
    Queued,
    /// A worker is executing the job.
    Running,
    /// The worker finished the job.
    Succeeded,
}

impl JobStatus {
    /// Whether the job will not change status again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queued => write!(f, "queued"),
            Self::Running => write!(f, "running"),
            Self::Succeeded => write!(f, "succeeded"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(Self::Queued),
            "running" => Ok(Self::Running),
            "succeeded" => Ok(Self::Succeeded),
            _ => Err(format!("invalid job status: {s}")),
        }
    }
}
