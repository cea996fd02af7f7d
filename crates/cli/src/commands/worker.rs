//! Standalone worker pool.
//!
//! # Environment Variables
//!
//! - `REDIS_URL` - Broker shared with the server (required)
//! - `WORKER_CONCURRENCY`, `NOTIFY_DELAY_SECS`, `CALLBACK_TIMEOUT_SECS`,
//!   `JOB_RESULT_TTL_SECS` - See the server configuration

use std::sync::Arc;

use secrecy::ExposeSecret;
use slash_relay_server::config::{WorkerConfig, redis_url_from_env};
use slash_relay_server::queue::RedisQueue;
use slash_relay_server::services::Notifier;
use slash_relay_server::shutdown_signal;
use slash_relay_server::slack::SlackClient;
use slash_relay_server::worker::WorkerPool;
use tracing::info;

use super::CommandError;

/// Run workers until Ctrl+C or SIGTERM, then let them finish their jobs.
///
/// # Errors
///
/// Returns error if configuration is invalid or Redis is unreachable.
pub async fn run(concurrency: Option<usize>) -> Result<(), CommandError> {
    let config = apply_override(WorkerConfig::from_env()?, concurrency)?;
    let redis_url = redis_url_from_env()?;

    let queue = RedisQueue::connect(redis_url.expose_secret(), config.result_ttl).await?;
    let notifier = Notifier::new(
        SlackClient::new(config.callback_timeout)?,
        config.notify_delay,
    );

    let pool = WorkerPool::spawn(Arc::new(queue.clone()), notifier, config.concurrency);

    shutdown_signal().await;
    info!("Draining workers");
    pool.shutdown_and_join().await;

    queue.quit().await?;
    Ok(())
}

/// Apply `--concurrency` over the environment value.
fn apply_override(
    mut config: WorkerConfig,
    concurrency: Option<usize>,
) -> Result<WorkerConfig, CommandError> {
    match concurrency {
        Some(0) => Err(CommandError::InvalidArgument(
            "--concurrency must be at least 1".to_string(),
        )),
        Some(n) => {
            config.concurrency = n;
            Ok(config)
        }
        None => Ok(config),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_override_replaces_concurrency() {
        let config = apply_override(WorkerConfig::default(), Some(12)).unwrap();
        assert_eq!(config.concurrency, 12);
    }

    #[test]
    fn test_no_override_keeps_config() {
        let config = apply_override(WorkerConfig::default(), None).unwrap();
        assert_eq!(config, WorkerConfig::default());
    }

    #[test]
    fn test_zero_override_rejected() {
        assert!(matches!(
            apply_override(WorkerConfig::default(), Some(0)),
            Err(CommandError::InvalidArgument(_))
        ));
    }
}
