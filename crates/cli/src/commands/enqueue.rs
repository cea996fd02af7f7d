//! Enqueue a job without a Slack request.
//!
//! # Environment Variables
//!
//! - `REDIS_URL` - Broker shared with the workers
//! - `JOB_RESULT_TTL_SECS` - Lifetime of the queued report

use secrecy::ExposeSecret;
use slash_relay_core::{CallbackUrl, CommandInvocation, Job};
use slash_relay_server::config::{WorkerConfig, redis_url_from_env};
use slash_relay_server::queue::{JobQueue, RedisQueue};
use tracing::info;

use super::CommandError;

/// Push one job and print its id.
///
/// # Errors
///
/// Returns error if the callback URL is invalid or Redis is unreachable.
pub async fn run(
    command: &str,
    text: &str,
    channel: &str,
    response_url: &str,
) -> Result<(), CommandError> {
    let job = Job::new(build_invocation(command, text, channel, response_url)?);

    let config = WorkerConfig::from_env()?;
    let queue = RedisQueue::connect(redis_url_from_env()?.expose_secret(), config.result_ttl).await?;
    queue.enqueue(&job).await?;
    queue.quit().await?;

    info!(job_id = %job.id, "Job enqueued");

    #[allow(clippy::print_stdout)]
    {
        println!("{}", job.id);
    }

    Ok(())
}

fn build_invocation(
    command: &str,
    text: &str,
    channel: &str,
    response_url: &str,
) -> Result<CommandInvocation, CommandError> {
    if channel.trim().is_empty() {
        return Err(CommandError::InvalidArgument(
            "--channel must not be empty".to_string(),
        ));
    }

    let response_url = CallbackUrl::parse(response_url)
        .map_err(|e| CommandError::InvalidArgument(format!("--response-url: {e}")))?;

    Ok(CommandInvocation::new(command, text, channel, response_url))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_invocation() {
        let invocation =
            build_invocation("/insights", "q3", "C1", "https://hooks.slack.com/commands/1/2")
                .unwrap();

        assert_eq!(invocation.command, "/insights");
        assert_eq!(invocation.text, "q3");
        assert_eq!(invocation.channel_id, "C1");
        assert_eq!(
            invocation.response_url.as_str(),
            "https://hooks.slack.com/commands/1/2"
        );
    }

    #[test]
    fn test_build_invocation_rejects_bad_url() {
        assert!(matches!(
            build_invocation("/insights", "", "C1", "ftp://example.com"),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_build_invocation_rejects_blank_channel() {
        assert!(build_invocation("/insights", "", " ", "https://example.com/r").is_err());
    }
}
