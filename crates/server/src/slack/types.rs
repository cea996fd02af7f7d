//! Slack message payloads.
//!
//! Only the subset needed to reply through a slash command's `response_url`.
//!
//! See: <https://api.slack.com/interactivity/handling#message_responses>

use serde::{Deserialize, Serialize};

/// Who sees a `response_url` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    /// Visible to everyone in the channel.
    #[default]
    InChannel,
    /// Visible only to the invoking user.
    Ephemeral,
}

/// Body posted to a `response_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Message text (mrkdwn).
    pub text: String,
    /// Audience of the message.
    pub response_type: ResponseType,
}

impl ResponseMessage {
    /// Create a message visible to the whole channel.
    #[must_use]
    pub fn in_channel(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            response_type: ResponseType::InChannel,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_in_channel_wire_format() {
        let json = serde_json::to_value(ResponseMessage::in_channel("Hello")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"text": "Hello", "response_type": "in_channel"})
        );
    }

    #[test]
    fn test_ephemeral_parses() {
        let message: ResponseMessage =
            serde_json::from_str(r#"{"text": "psst", "response_type": "ephemeral"}"#).unwrap();
        assert_eq!(message.response_type, ResponseType::Ephemeral);
    }
}
