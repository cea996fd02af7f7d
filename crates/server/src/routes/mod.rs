//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (queue backend reachable)
//!
//! # Slack
//! POST /slack/commands         - Slash command webhook (signed)
//! GET  /slack/jobs/{id}        - Job report lookup
//! ```

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod jobs;
pub mod slack;

/// Build the application's routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(slack::router())
        .merge(jobs::router())
}
