//! Unified error handling for HTTP handlers.
//!
//! Every error response is a small JSON object with a `status` field so
//! callers never see internal details.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::queue::QueueError;
use crate::slack::SignatureError;

/// Application-level error type for the receiver.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request did not carry a valid Slack signature.
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] SignatureError),

    /// Signed body could not be decoded as a slash command.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Queue rejected or failed the operation.
    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::FORBIDDEN,
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Queue(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable `status` value in the response body.
    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "invalid_request",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::NotFound(_) => "not_found",
            Self::Queue(_) => "queue_unavailable",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            // Server-side failures go to Sentry
            Self::Queue(_) | Self::Internal(_) => {
                let event_id = sentry::capture_error(&self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Request failed"
                );
            }
            Self::Unauthorized(_) => {
                tracing::warn!(error = %self, "Rejected request");
            }
            Self::InvalidPayload(_) | Self::NotFound(_) => {
                tracing::debug!(error = %self, "Request error");
            }
        }

        let body = Json(json!({ "status": self.status_label() }));
        (self.status_code(), body).into_response()
    }
}
