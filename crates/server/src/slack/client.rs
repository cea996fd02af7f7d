//! Slack `response_url` client.
//!
//! Slash command replies do not go through the Web API: Slack hands out a
//! per-invocation `response_url` that accepts a JSON message without a bot
//! token.

use std::time::Duration;

use reqwest::Client;
use slash_relay_core::CallbackUrl;
use tracing::{debug, instrument};

use super::error::SlackError;
use super::types::ResponseMessage;

/// Default per-request timeout for callback POSTs.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for posting replies to `response_url` endpoints.
#[derive(Debug, Clone)]
pub struct SlackClient {
    /// HTTP client.
    client: Client,
}

impl SlackClient {
    /// Create a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built (TLS backend failure).
    pub fn new(timeout: Duration) -> Result<Self, SlackError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("slash-relay/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SlackError::Config(e.to_string()))?;

        Ok(Self { client })
    }

    /// Post a message to a `response_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the endpoint answers with a
    /// non-success status.
    #[instrument(skip(self, message), fields(host = %response_url.host()))]
    pub async fn respond_to_url(
        &self,
        response_url: &CallbackUrl,
        message: &ResponseMessage,
    ) -> Result<(), SlackError> {
        let response = self
            .client
            .post(response_url.as_str())
            .json(message)
            .send()
            .await
            .map_err(|e| SlackError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SlackError::Response { status, body });
        }

        debug!("Responded to Slack response_url");

        Ok(())
    }
}
