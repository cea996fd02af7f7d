//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SLACK_SIGNING_SECRET` - Slack app signing secret
//!
//! ## Optional
//! - `REDIS_URL` - Broker and result store (default: in-memory queue)
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `EMBEDDED_WORKERS` - Run workers inside the server when using Redis (default: false)
//! - `SIGNATURE_MAX_AGE_SECS` - Request timestamp tolerance (default: 300)
//! - `LOG_FORMAT` - `json` for structured logs, anything else for text
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (workers)
//! - `WORKER_CONCURRENCY` - Worker tasks per pool (default: 4)
//! - `NOTIFY_DELAY_SECS` - Wait between the two replies (default: 5)
//! - `CALLBACK_TIMEOUT_SECS` - Timeout for each reply POST (default: 10)
//! - `JOB_RESULT_TTL_SECS` - Lifetime of job reports in Redis (default: 86400)
//!
//! ## Optional (TLS)
//! - `TLS_CERT` - PEM-encoded certificate chain
//! - `TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use crate::queue::DEFAULT_RESULT_TTL;
use crate::services::DEFAULT_DELAY;
use crate::slack::DEFAULT_TIMEOUT;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Slack signing secret for webhook verification
    pub signing_secret: SecretString,
    /// Redis connection URL (may contain a password); `None` selects the in-memory queue
    pub redis_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Run a worker pool inside the server process even when using Redis
    pub embedded_workers: bool,
    /// Allowed distance between a request's timestamp and local time
    pub signature_max_age: Duration,
    /// Worker pool settings
    pub worker: WorkerConfig,
    /// Logging and error tracking
    pub telemetry: TelemetryConfig,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// Worker pool settings, shared by the server and the standalone worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Number of worker tasks
    pub concurrency: usize,
    /// Wait between the two replies
    pub notify_delay: Duration,
    /// Timeout for each reply POST
    pub callback_timeout: Duration,
    /// Lifetime of job reports in Redis
    pub result_ttl: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            notify_delay: DEFAULT_DELAY,
            callback_timeout: DEFAULT_TIMEOUT,
            result_ttl: DEFAULT_RESULT_TTL,
        }
    }
}

/// Logging and Sentry settings.
#[derive(Debug, Clone, Default)]
pub struct TelemetryConfig {
    /// Emit JSON logs instead of text
    pub json_logs: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

/// Source of configuration values, keyed by variable name.
trait Lookup {
    fn get(&self, key: &str) -> Option<String>;
}

impl<F: Fn(&str) -> Option<String>> Lookup for F {
    fn get(&self, key: &str) -> Option<String> {
        self(key).filter(|v| !v.trim().is_empty())
    }
}

/// Process environment.
fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(&env_lookup)
    }

    /// Load configuration from a map of variables (tests and tooling).
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| vars.get(key).cloned())
    }

    fn from_lookup(env: &impl Lookup) -> Result<Self, ConfigError> {
        let signing_secret = signing_secret_from(env)?;
        let redis_url = env.get("REDIS_URL").map(SecretString::from);
        let host = parse_or(env, "HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_or(env, "PORT", 3000u16)?;
        let embedded_workers = parse_bool_or(env, "EMBEDDED_WORKERS", false)?;
        let signature_max_age = secs_or(env, "SIGNATURE_MAX_AGE_SECS", 300)?;
        let worker = WorkerConfig::from_lookup(env)?;
        let telemetry = TelemetryConfig::from_lookup(env);
        let tls = TlsConfig::from_lookup(env)?;

        Ok(Self {
            signing_secret,
            redis_url,
            host,
            port,
            embedded_workers,
            signature_max_age,
            worker,
            telemetry,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether this process must run its own worker pool.
    ///
    /// Always true for the in-memory queue, since no other process can see it.
    #[must_use]
    pub const fn runs_workers(&self) -> bool {
        self.redis_url.is_none() || self.embedded_workers
    }
}

impl WorkerConfig {
    /// Load worker settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&env_lookup)
    }

    fn from_lookup(env: &impl Lookup) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let concurrency = parse_or(env, "WORKER_CONCURRENCY", defaults.concurrency)?;
        if concurrency == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "WORKER_CONCURRENCY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            concurrency,
            notify_delay: secs_or(env, "NOTIFY_DELAY_SECS", defaults.notify_delay.as_secs())?,
            callback_timeout: secs_or(
                env,
                "CALLBACK_TIMEOUT_SECS",
                defaults.callback_timeout.as_secs(),
            )?,
            result_ttl: secs_or(env, "JOB_RESULT_TTL_SECS", defaults.result_ttl.as_secs())?,
        })
    }
}

impl TelemetryConfig {
    /// Load telemetry settings from environment variables.
    ///
    /// Unparsable sample rates fall back to 1.0.
    #[must_use]
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&env_lookup)
    }

    fn from_lookup(env: &impl Lookup) -> Self {
        Self {
            json_logs: env
                .get("LOG_FORMAT")
                .is_some_and(|f| f.eq_ignore_ascii_case("json")),
            sentry_dsn: env.get("SENTRY_DSN"),
            sentry_environment: env.get("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env
                .get("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: env
                .get("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        }
    }
}

impl TlsConfig {
    fn from_lookup(env: &impl Lookup) -> Result<Option<Self>, ConfigError> {
        match (env.get("TLS_CERT"), env.get("TLS_KEY")) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "TLS_*".to_string(),
                "Both TLS_CERT and TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

/// Load the Slack signing secret from the environment.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if `SLACK_SIGNING_SECRET` is unset.
pub fn signing_secret_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    signing_secret_from(&env_lookup)
}

/// Load the Redis URL from the environment.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if `REDIS_URL` is unset.
pub fn redis_url_from_env() -> Result<SecretString, ConfigError> {
    let _ = dotenvy::dotenv();
    Lookup::get(&env_lookup, "REDIS_URL")
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar("REDIS_URL".to_string()))
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Read the signing secret, warning (not failing) on a weak value: Slack
/// issues the secret, so operators cannot choose a stronger one.
fn signing_secret_from(env: &impl Lookup) -> Result<SecretString, ConfigError> {
    let secret = env
        .get("SLACK_SIGNING_SECRET")
        .ok_or_else(|| ConfigError::MissingEnvVar("SLACK_SIGNING_SECRET".to_string()))?;

    if let Err(e) = validate_secret_strength(&secret, "SLACK_SIGNING_SECRET") {
        tracing::warn!("SLACK_SIGNING_SECRET validation warning: {e}");
    }

    Ok(SecretString::from(secret))
}

/// Parse a variable, or use `default` when it is unset.
fn parse_or<T>(env: &impl Lookup, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env.get(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Parse a whole number of seconds.
fn secs_or(env: &impl Lookup, key: &str, default: u64) -> Result<Duration, ConfigError> {
    parse_or(env, key, default).map(Duration::from_secs)
}

/// Parse a boolean flag (`true`/`false`/`1`/`0`/`yes`/`no`).
fn parse_bool_or(env: &impl Lookup, key: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = env.get(key) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}
