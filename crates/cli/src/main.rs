//! slash-relay CLI - Workers and operator tools.
//!
//! # Usage
//!
//! ```bash
//! # Run a standalone worker pool against REDIS_URL
//! slash-relay-cli worker --concurrency 8
//!
//! # Print signed headers for a request body (for curl testing)
//! slash-relay-cli sign --body 'command=%2Finsights&text=hi&channel_id=C1&response_url=...'
//!
//! # Push a job without going through Slack
//! slash-relay-cli enqueue --command /insights --channel C1 --response-url https://...
//!
//! # Show a job report
//! slash-relay-cli status 6f1c2a9e-3b7d-4c55-9a0e-2f4b8d1e7c30
//! ```
//!
//! # Commands
//!
//! - `worker` - Run background workers
//! - `sign` - Compute Slack signature headers
//! - `enqueue` - Enqueue a job directly
//! - `status` - Look up a job report

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use slash_relay_server::config::TelemetryConfig;
use slash_relay_server::telemetry;

mod commands;

/// Log filter for the worker when `RUST_LOG` is not set.
const WORKER_LOG_FILTER: &str = "slash_relay_server=info,slash_relay_cli=info";

#[derive(Parser)]
#[command(name = "slash-relay-cli")]
#[command(author, version, about = "slash-relay CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a standalone worker pool against Redis
    Worker {
        /// Number of worker tasks (overrides `WORKER_CONCURRENCY`)
        #[arg(short, long)]
        concurrency: Option<usize>,
    },
    /// Print Slack signature headers for a request body
    Sign {
        /// Raw request body, exactly as it will be sent
        #[arg(short, long)]
        body: String,

        /// Unix timestamp to sign with (default: now)
        #[arg(short, long)]
        timestamp: Option<i64>,
    },
    /// Enqueue a job directly, bypassing the webhook
    Enqueue {
        /// Slash command name
        #[arg(long, default_value = "/insights")]
        command: String,

        /// Command text
        #[arg(long, default_value = "")]
        text: String,

        /// Channel ID
        #[arg(long)]
        channel: String,

        /// Callback URL the worker will post to
        #[arg(long)]
        response_url: String,
    },
    /// Show the report for a job
    Status {
        /// Job ID
        job_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Workers are long-running and get the server's logging and Sentry setup
    let _sentry_guard = if matches!(cli.command, Commands::Worker { .. }) {
        telemetry::init(&TelemetryConfig::from_env(), WORKER_LOG_FILTER)
    } else {
        tracing_subscriber::fmt::init();
        None
    };

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Worker { concurrency } => commands::worker::run(concurrency).await?,
        Commands::Sign { body, timestamp } => commands::sign::run(&body, timestamp)?,
        Commands::Enqueue {
            command,
            text,
            channel,
            response_url,
        } => commands::enqueue::run(&command, &text, &channel, &response_url).await?,
        Commands::Status { job_id } => commands::status::run(&job_id).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_worker_concurrency() {
        let cli = Cli::try_parse_from(["slash-relay-cli", "worker", "-c", "3"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Worker { concurrency: Some(3) })
        ));
    }

    #[test]
    fn test_enqueue_requires_channel() {
        let cli = Cli::try_parse_from([
            "slash-relay-cli",
            "enqueue",
            "--response-url",
            "https://example.com/r",
        ]);
        assert!(cli.is_err());
    }
}
