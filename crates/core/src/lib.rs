//! slash-relay Core - Shared types library.
//!
//! This crate provides common types used across all slash-relay components:
//! - `server` - Slash command receiver, worker pool, and HTTP routes
//! - `cli` - Command-line tools for running workers and signing test requests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no broker access, no HTTP
//! clients. Both the receiver and the workers depend on it so the job
//! envelope has a single definition on either side of the broker.
//!
//! # Modules
//!
//! - [`types`] - Command invocations, callback URLs, jobs, and job reports

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
