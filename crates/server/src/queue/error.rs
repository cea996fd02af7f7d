//! Broker errors.

use thiserror::Error;

/// Errors from the job queue and result store.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The broker could not be reached or rejected a command.
    #[error("Broker error: {0}")]
    Broker(String),

    /// A job or report could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The queue no longer accepts jobs.
    #[error("Queue closed")]
    Closed,
}

impl From<fred::error::Error> for QueueError {
    fn from(err: fred::error::Error) -> Self {
        Self::Broker(err.to_string())
    }
}
