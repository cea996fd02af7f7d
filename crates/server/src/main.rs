//! slash-relay - Slack slash command receiver.
//!
//! Serves `POST /slack/commands` and acknowledges each verified command
//! immediately, leaving the replies to background workers.
//!
//! # Topology
//!
//! - Without `REDIS_URL`: in-memory queue, workers always run in this process
//! - With `REDIS_URL`: jobs go to Redis; workers run here only when
//!   `EMBEDDED_WORKERS=true`, otherwise start `slash-relay-cli worker`

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use axum_server::Handle;
use axum_server::tls_rustls::RustlsConfig;
use secrecy::ExposeSecret;
use slash_relay_server::config::ServerConfig;
use slash_relay_server::queue::{JobQueue, MemoryQueue, RedisQueue};
use slash_relay_server::services::Notifier;
use slash_relay_server::slack::SlackClient;
use slash_relay_server::state::AppState;
use slash_relay_server::worker::WorkerPool;
use slash_relay_server::{shutdown_signal, telemetry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Install rustls crypto provider (must be done before any TLS operations)
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env()?;

    let _sentry_guard = telemetry::init(&config.telemetry, telemetry::DEFAULT_LOG_FILTER);

    let queue: Arc<dyn JobQueue> = if let Some(redis_url) = &config.redis_url {
        Arc::new(RedisQueue::connect(redis_url.expose_secret(), config.worker.result_ttl).await?)
    } else {
        tracing::warn!("REDIS_URL not set, using in-memory queue (jobs are lost on restart)");
        Arc::new(MemoryQueue::new())
    };

    let workers = if config.runs_workers() {
        let notifier = Notifier::new(
            SlackClient::new(config.worker.callback_timeout)?,
            config.worker.notify_delay,
        );
        Some(WorkerPool::spawn(
            Arc::clone(&queue),
            notifier,
            config.worker.concurrency,
        ))
    } else {
        tracing::info!("Embedded workers disabled, run slash-relay-cli worker to process jobs");
        None
    };

    let state = AppState::new(&config, queue);

    let app = slash_relay_server::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();

    if let Some(tls_config) = &config.tls {
        let rustls_config = RustlsConfig::from_pem(
            tls_config.cert_pem.as_bytes().to_vec(),
            tls_config.key_pem.expose_secret().as_bytes().to_vec(),
        )
        .await?;

        tracing::info!("slash-relay listening on https://{}", addr);

        let handle = Handle::new();
        let shutdown_handle = handle.clone();

        // Spawn task to handle graceful shutdown
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown_handle.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
        });

        axum_server::bind_rustls(addr, rustls_config)
            .handle(handle)
            .serve(app.into_make_service())
            .await?;
    } else {
        tracing::info!("slash-relay listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    }

    // Let workers finish the job in hand
    if let Some(pool) = workers {
        pool.shutdown_and_join().await;
    }

    Ok(())
}
