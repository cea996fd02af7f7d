//! Slack-related errors.

use thiserror::Error;

/// Errors that can occur when posting to a Slack `response_url`.
///
/// These are delivery failures: the notifier logs them and moves on.
#[derive(Debug, Error)]
pub enum SlackError {
    /// HTTP request failed before a response arrived.
    #[error("Slack request failed: {0}")]
    Request(String),

    /// Slack answered with a non-success status.
    #[error("Slack responded {status}: {body}")]
    Response {
        /// HTTP status code.
        status: u16,
        /// Response body, for the log.
        body: String,
    },

    /// Configuration error.
    #[error("Slack configuration error: {0}")]
    Config(String),
}

/// Reasons an inbound request fails signature verification.
///
/// All of them surface to the caller the same way (403); the variants exist
/// for the log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// A required header was absent or not valid UTF-8.
    #[error("Missing header: {0}")]
    MissingHeader(&'static str),

    /// Timestamp header is not an integer.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Timestamp is too far from local time.
    #[error("Request timestamp outside tolerance ({skew_secs}s skew)")]
    StaleTimestamp {
        /// Local time minus request time, in seconds.
        skew_secs: i64,
    },

    /// Signature header is not `v0=<hex>`.
    #[error("Malformed signature")]
    Malformed,

    /// Signature does not match the body.
    #[error("Signature mismatch")]
    Mismatch,

    /// System clock is unusable.
    #[error("System clock before Unix epoch")]
    Clock,
}
