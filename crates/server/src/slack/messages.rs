//! Fixed message texts for the slash command flow.

use super::types::ResponseMessage;

/// Body of the immediate 200 reply to the slash command webhook.
pub const ACKNOWLEDGMENT: &str = "We are finding your insights, give us a moment :grimacing:";

/// Text of the first deferred reply.
pub const FIRST_REPLY: &str = "Hello, World!";

/// Text of the second deferred reply, sent after the notifier's wait.
pub const SECOND_REPLY: &str = "Waiting for 5 seconds!";

/// Build the first deferred reply.
#[must_use]
pub fn build_first_reply() -> ResponseMessage {
    ResponseMessage::in_channel(FIRST_REPLY)
}

/// Build the second deferred reply.
#[must_use]
pub fn build_second_reply() -> ResponseMessage {
    ResponseMessage::in_channel(SECOND_REPLY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::ResponseType;

    #[test]
    fn test_replies_differ() {
        assert_ne!(build_first_reply().text, build_second_reply().text);
    }

    #[test]
    fn test_replies_are_in_channel() {
        assert_eq!(build_first_reply().response_type, ResponseType::InChannel);
        assert_eq!(build_second_reply().response_type, ResponseType::InChannel);
    }
}
