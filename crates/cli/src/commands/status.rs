//! Print a job report from the result store.

use secrecy::ExposeSecret;
use slash_relay_core::JobId;
use slash_relay_server::config::{WorkerConfig, redis_url_from_env};
use slash_relay_server::queue::{JobQueue, RedisQueue};

use super::CommandError;

/// Look up and print the report for `job_id` as JSON.
///
/// # Errors
///
/// Returns error if the id is malformed, Redis is unreachable, or no report
/// exists (it may have expired).
pub async fn run(job_id: &str) -> Result<(), CommandError> {
    let job_id: JobId = job_id
        .parse()
        .map_err(|e| CommandError::InvalidArgument(format!("job id: {e}")))?;

    let config = WorkerConfig::from_env()?;
    let queue = RedisQueue::connect(redis_url_from_env()?.expose_secret(), config.result_ttl).await?;
    let report = queue.report(job_id).await?;
    queue.quit().await?;

    let report = report.ok_or_else(|| CommandError::NotFound(format!("job {job_id}")))?;
    let json = serde_json::to_string_pretty(&report)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }

    Ok(())
}
