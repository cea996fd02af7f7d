//! Deferred notifier.
//!
//! Replies to a slash command twice through its `response_url`:
//! 1. Post the first reply
//! 2. Wait the configured delay (the worker running it stays busy)
//! 3. Post the second reply
//!
//! Each POST stands alone. A failure is logged and counted, never retried,
//! and never stops the other POST from being attempted.

use std::time::Duration;

use slash_relay_core::CommandInvocation;
use tracing::{debug, instrument, warn};

use crate::slack::{ResponseMessage, SlackClient, build_first_reply, build_second_reply};

/// Default wait between the two replies.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

/// What happened to a notifier run's callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotifyOutcome {
    /// POSTs attempted.
    pub attempted: u32,
    /// POSTs that failed.
    pub failed: u32,
}

impl NotifyOutcome {
    /// Whether every attempted POST was delivered.
    #[must_use]
    pub const fn all_delivered(&self) -> bool {
        self.failed == 0
    }
}

/// Sends the two deferred replies for an invocation.
#[derive(Debug, Clone)]
pub struct Notifier {
    slack: SlackClient,
    delay: Duration,
}

impl Notifier {
    /// Create a notifier that waits `delay` between replies.
    #[must_use]
    pub const fn new(slack: SlackClient, delay: Duration) -> Self {
        Self { slack, delay }
    }

    /// The wait between replies.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Run both replies for an invocation.
    ///
    /// Never fails: delivery errors end up in the log and in the returned
    /// outcome.
    #[instrument(
        skip(self, invocation),
        fields(command = %invocation.command, channel = %invocation.channel_id)
    )]
    pub async fn notify(&self, invocation: &CommandInvocation) -> NotifyOutcome {
        let mut outcome = NotifyOutcome::default();

        self.deliver(invocation, &build_first_reply(), &mut outcome)
            .await;

        tokio::time::sleep(self.delay).await;

        self.deliver(invocation, &build_second_reply(), &mut outcome)
            .await;

        debug!(
            attempted = outcome.attempted,
            failed = outcome.failed,
            "Notifier finished"
        );

        outcome
    }

    async fn deliver(
        &self,
        invocation: &CommandInvocation,
        message: &ResponseMessage,
        outcome: &mut NotifyOutcome,
    ) {
        outcome.attempted += 1;

        if let Err(e) = self
            .slack
            .respond_to_url(&invocation.response_url, message)
            .await
        {
            outcome.failed += 1;
            warn!(
                error = %e,
                host = %invocation.response_url.host(),
                "Error sending message to response_url"
            );
        }
    }
}
