//! CLI command implementations.

use slash_relay_server::config::ConfigError;
use slash_relay_server::queue::QueueError;
use slash_relay_server::slack::{SignatureError, SlackError};
use thiserror::Error;

pub mod enqueue;
pub mod sign;
pub mod status;
pub mod worker;

/// Errors shared by the CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Broker or result store failed.
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Callback client could not be built.
    #[error("Slack client error: {0}")]
    Slack(#[from] SlackError),

    /// Clock or signing failure.
    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    /// Output could not be rendered.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An argument was rejected.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),
}
