//! Integration tests for slash-relay.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p slash-relay-integration-tests
//! ```
//!
//! Everything runs in-process: the router is driven with
//! `tower::ServiceExt::oneshot`, the queue is the in-memory backend, and
//! Slack's `response_url` is played by a [`CaptureServer`] on a local port.
//!
//! # Test Categories
//!
//! - `slash_commands` - Webhook receiver, job lookup, and health routes
//! - `notifier` - Callback delivery order, timing, and failure handling
//! - `end_to_end` - Request through queue and worker to both callbacks

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    routing::post,
};
use secrecy::SecretString;
use slash_relay_core::CallbackUrl;
use slash_relay_server::config::ServerConfig;
use slash_relay_server::slack::{SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER, unix_now};
use tokio::task::JoinHandle;

/// Signing secret shared by test requests and the test server config.
pub const SIGNING_SECRET: &str = "8f742231b10e8888abcd99yyyzzz85a5";

// =============================================================================
// Requests
// =============================================================================

/// Server configuration with the test signing secret and defaults elsewhere.
#[must_use]
pub fn test_config() -> ServerConfig {
    let vars = HashMap::from([(
        "SLACK_SIGNING_SECRET".to_string(),
        SIGNING_SECRET.to_string(),
    )]);
    ServerConfig::from_map(&vars).expect("test config is valid")
}

/// URL-encoded slash command form posting back to `response_url`.
#[must_use]
pub fn command_form(text: &str, response_url: &CallbackUrl) -> String {
    serde_urlencoded::to_string([
        ("token", "gIkuvaNzQIHg97ATvDxqgjtO"),
        ("team_id", "T0001"),
        ("team_domain", "example"),
        ("channel_id", "C2147483705"),
        ("channel_name", "test"),
        ("user_id", "U2147483697"),
        ("user_name", "Steve"),
        ("command", "/insights"),
        ("text", text),
        ("response_url", response_url.as_str()),
        ("trigger_id", "13345224609.738474920.8088930838d88f008e0"),
    ])
    .expect("string pairs always encode")
}

/// Build a `POST /slack/commands` request signed with [`SIGNING_SECRET`].
#[must_use]
pub fn signed_command_request(form: &str) -> Request<Body> {
    let timestamp = unix_now().expect("clock after epoch").to_string();
    let signature = SignatureVerifier::new(SecretString::from(SIGNING_SECRET))
        .sign(&timestamp, form.as_bytes());

    command_request(form, Some(&timestamp), Some(&signature))
}

/// Build a `POST /slack/commands` request with arbitrary auth headers.
#[must_use]
pub fn command_request(
    form: &str,
    timestamp: Option<&str>,
    signature: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::post("/slack/commands")
        .header("content-type", "application/x-www-form-urlencoded");
    if let Some(timestamp) = timestamp {
        builder = builder.header(TIMESTAMP_HEADER, timestamp);
    }
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder
        .body(Body::from(form.to_owned()))
        .expect("valid request")
}

/// Read a response body as JSON.
pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

// =============================================================================
// Capture Server
// =============================================================================

/// One POST received by a [`CaptureServer`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    /// When the request arrived.
    pub received_at: Instant,
    /// `Content-Type` header, if sent.
    pub content_type: Option<String>,
    /// Parsed JSON body (`Null` if the body was not JSON).
    pub body: serde_json::Value,
}

#[derive(Default)]
struct CaptureInner {
    requests: Mutex<Vec<CapturedRequest>>,
    responses: Mutex<VecDeque<StatusCode>>,
}

/// Local HTTP server standing in for a Slack `response_url`.
///
/// Records every POST to `/callback` and answers with the scripted statuses
/// in order, then 200 once the script runs out.
pub struct CaptureServer {
    addr: SocketAddr,
    inner: Arc<CaptureInner>,
    handle: JoinHandle<()>,
}

impl CaptureServer {
    /// Start a server that always answers 200.
    pub async fn start() -> Self {
        Self::with_responses([]).await
    }

    /// Start a server that answers with `responses` first.
    pub async fn with_responses(responses: impl IntoIterator<Item = StatusCode>) -> Self {
        let inner = Arc::new(CaptureInner {
            requests: Mutex::default(),
            responses: Mutex::new(responses.into_iter().collect()),
        });

        let app = Router::new()
            .route("/callback", post(capture))
            .with_state(Arc::clone(&inner));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind capture server");
        let addr = listener.local_addr().expect("capture server address");

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            inner,
            handle,
        }
    }

    /// Callback URL pointing at this server.
    #[must_use]
    pub fn callback_url(&self) -> CallbackUrl {
        CallbackUrl::parse(&format!("http://{}/callback", self.addr)).expect("valid callback URL")
    }

    /// Requests received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.inner.requests.lock().expect("requests lock").clone()
    }

    /// Wait until at least `count` requests have arrived or `timeout` passes.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<CapturedRequest> {
        let deadline = Instant::now() + timeout;
        loop {
            let requests = self.requests();
            if requests.len() >= count || Instant::now() >= deadline {
                return requests;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

impl Drop for CaptureServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn capture(
    State(inner): State<Arc<CaptureInner>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let request = CapturedRequest {
        received_at: Instant::now(),
        content_type: headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned),
        body: serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null),
    };

    inner.requests.lock().expect("requests lock").push(request);
    inner
        .responses
        .lock()
        .expect("responses lock")
        .pop_front()
        .unwrap_or(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_form_escapes_values() {
        let url = CallbackUrl::parse("https://hooks.slack.com/commands/T1/2/abc?x=1").expect("url");
        let form = command_form("weekly & more", &url);

        assert!(form.contains("command=%2Finsights"));
        let fields: HashMap<String, String> = serde_urlencoded::from_str(&form).expect("decodes");
        assert_eq!(fields["text"], "weekly & more");
        assert_eq!(fields["response_url"], url.as_str());
    }

    #[tokio::test]
    async fn test_capture_server_scripted_responses() {
        let server = CaptureServer::with_responses([StatusCode::BAD_GATEWAY]).await;
        assert!(server.callback_url().as_str().starts_with("http://127.0.0.1:"));
        assert!(server.requests().is_empty());
    }
}
