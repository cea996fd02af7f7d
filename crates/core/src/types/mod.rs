//! Core types for slash-relay.
//!
//! This module provides type-safe wrappers for slash command domain concepts.

pub mod callback_url;
pub mod invocation;
pub mod job;
pub mod status;

pub use callback_url::{CallbackUrl, CallbackUrlError};
pub use invocation::CommandInvocation;
pub use job::{Job, JobId, JobReport};
pub use status::JobStatus;
