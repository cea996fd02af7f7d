//! Job report lookup.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use slash_relay_core::{JobId, JobReport};
use tracing::instrument;

use crate::error::AppError;
use crate::state::AppState;

/// Create job lookup routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/slack/jobs/{id}", get(show))
}

/// Return the latest report for a job.
#[instrument(skip(state))]
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobReport>, AppError> {
    let job_id: JobId = id
        .parse()
        .map_err(|_| AppError::InvalidPayload(format!("malformed job id '{id}'")))?;

    state
        .queue()
        .report(job_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("job {job_id}")))
}
