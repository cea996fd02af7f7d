//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ServerConfig;
use crate::queue::JobQueue;
use crate::slack::SignatureVerifier;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    verifier: SignatureVerifier,
    queue: Arc<dyn JobQueue>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("verifier", &self.inner.verifier)
            .field("queue", &self.inner.queue.backend())
            .finish()
    }
}

impl AppState {
    /// Build state from configuration and a queue backend.
    #[must_use]
    pub fn new(config: &ServerConfig, queue: Arc<dyn JobQueue>) -> Self {
        let verifier = SignatureVerifier::with_max_age(
            config.signing_secret.clone(),
            config.signature_max_age,
        );

        Self {
            inner: Arc::new(AppStateInner { verifier, queue }),
        }
    }

    /// Get the Slack signature verifier.
    #[must_use]
    pub fn verifier(&self) -> &SignatureVerifier {
        &self.inner.verifier
    }

    /// Get the job queue.
    #[must_use]
    pub fn queue(&self) -> &dyn JobQueue {
        self.inner.queue.as_ref()
    }
}
