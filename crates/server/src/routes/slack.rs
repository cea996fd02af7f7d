//! Slack slash command webhook.
//!
//! Verifies the request signature over the raw body, turns the form into a
//! job, enqueues it and acknowledges immediately. The replies come later
//! from a worker.

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue},
    response::IntoResponse,
    routing::post,
};
use slash_relay_core::{CommandInvocation, Job};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::slack::{ACKNOWLEDGMENT, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use crate::state::AppState;

/// Response header carrying the id of the enqueued job.
pub const JOB_ID_HEADER: HeaderName = HeaderName::from_static("x-job-id");

/// Create Slack webhook routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/slack/commands", post(handle_command))
}

/// Handle a slash command invocation.
///
/// The body is taken as raw bytes because the signature covers it exactly
/// as sent.
#[instrument(skip(state, headers, body))]
async fn handle_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    state.verifier().verify(
        header_str(&headers, TIMESTAMP_HEADER),
        &body,
        header_str(&headers, SIGNATURE_HEADER),
    )?;

    let invocation: CommandInvocation = serde_urlencoded::from_bytes(&body)
        .map_err(|e| AppError::InvalidPayload(e.to_string()))?;

    let job = Job::new(invocation);
    state.queue().enqueue(&job).await?;

    info!(
        job_id = %job.id,
        command = %job.invocation.command,
        channel = %job.invocation.channel_id,
        "Slash command accepted"
    );

    let job_id = HeaderValue::from_str(&job.id.to_string())
        .map_err(|e| AppError::Internal(format!("job id header: {e}")))?;

    Ok(([(JOB_ID_HEADER, job_id)], Json(ACKNOWLEDGMENT)))
}

/// A header's value, if present and valid UTF-8.
fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
