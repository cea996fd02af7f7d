//! Slack integration for slash commands.
//!
//! This module provides:
//! - [`SignatureVerifier`] for authenticating inbound webhooks
//! - [`SlackClient`] for replying through a command's `response_url`
//! - Reply payload types and the fixed reply texts
//!
//! # Flow
//!
//! 1. Slack posts a slash command to `/slack/commands`
//! 2. The handler verifies the signature and enqueues a job
//! 3. A worker replies twice through the `response_url`

mod client;
mod error;
mod messages;
mod signature;
mod types;

pub use client::{DEFAULT_TIMEOUT, SlackClient};
pub use error::{SignatureError, SlackError};
pub use messages::{
    ACKNOWLEDGMENT, FIRST_REPLY, SECOND_REPLY, build_first_reply, build_second_reply,
};
pub use signature::{
    DEFAULT_MAX_AGE, SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER, unix_now,
};
pub use types::{ResponseMessage, ResponseType};
