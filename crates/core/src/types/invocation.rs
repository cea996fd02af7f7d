//! Slash command invocation.

use serde::{Deserialize, Serialize};

use super::CallbackUrl;

/// A single slash command invocation, as posted by Slack.
///
/// Decoded from the `application/x-www-form-urlencoded` webhook body and
/// handed to the worker by value. Slack sends more fields than these; the
/// optional ones are kept for logging and for anything downstream that wants
/// to address the invoking user, everything else is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInvocation {
    /// The command that was typed, including the slash (e.g. `/insights`).
    pub command: String,
    /// Text after the command. Slack omits the field for a bare command.
    #[serde(default)]
    pub text: String,
    /// Channel the command was invoked in.
    pub channel_id: String,
    /// Where to post asynchronous replies.
    pub response_url: CallbackUrl,
    /// Workspace the command came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// User who invoked the command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Display name of the invoking user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Short-lived token for opening modals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_id: Option<String>,
}

impl CommandInvocation {
    /// Create an invocation with only the required fields set.
    #[must_use]
    pub fn new(
        command: impl Into<String>,
        text: impl Into<String>,
        channel_id: impl Into<String>,
        response_url: CallbackUrl,
    ) -> Self {
        Self {
            command: command.into(),
            text: text.into(),
            channel_id: channel_id.into(),
            response_url,
            team_id: None,
            user_id: None,
            user_name: None,
            trigger_id: None,
        }
    }
}
