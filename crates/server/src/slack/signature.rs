//! Slack request signature verification.
//!
//! Implements Slack's signing scheme:
//! <https://api.slack.com/authentication/verifying-requests-from-slack>
//!
//! The signing string is `v0:{timestamp}:{raw body}`, keyed with the app's
//! signing secret using HMAC-SHA256 and sent hex encoded as `v0={digest}` in
//! `X-Slack-Signature`.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::{debug, instrument};

use super::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "X-Slack-Signature";

/// Header carrying the Unix timestamp the signature was made at.
pub const TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";

/// Signature scheme version prefix.
const VERSION: &str = "v0";

/// Default tolerance between the request timestamp and local time.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(300);

/// Verifies (and, for tooling, produces) Slack request signatures.
#[derive(Clone)]
pub struct SignatureVerifier {
    signing_secret: SecretString,
    max_age: Duration,
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("signing_secret", &"[REDACTED]")
            .field("max_age", &self.max_age)
            .finish()
    }
}

impl SignatureVerifier {
    /// Create a verifier with the default five minute timestamp tolerance.
    #[must_use]
    pub const fn new(signing_secret: SecretString) -> Self {
        Self::with_max_age(signing_secret, DEFAULT_MAX_AGE)
    }

    /// Create a verifier with a custom timestamp tolerance.
    #[must_use]
    pub const fn with_max_age(signing_secret: SecretString, max_age: Duration) -> Self {
        Self {
            signing_secret,
            max_age,
        }
    }

    /// Verify a request against the current system time.
    ///
    /// Either header may be absent; that is reported as an error rather than
    /// handled by the caller so every rejection goes through one path.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureError`] if a header is missing, the timestamp is
    /// unparsable or outside the tolerance, or the signature does not match.
    pub fn verify(
        &self,
        timestamp: Option<&str>,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), SignatureError> {
        self.verify_at(unix_now()?, timestamp, body, signature)
    }

    /// Verify a request as if the current time were `now` (Unix seconds).
    ///
    /// # Errors
    ///
    /// See [`SignatureVerifier::verify`].
    #[instrument(skip(self, body, signature))]
    pub fn verify_at(
        &self,
        now: i64,
        timestamp: Option<&str>,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<(), SignatureError> {
        let timestamp = timestamp.ok_or(SignatureError::MissingHeader(TIMESTAMP_HEADER))?;
        let signature = signature.ok_or(SignatureError::MissingHeader(SIGNATURE_HEADER))?;

        let ts: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::InvalidTimestamp(timestamp.to_owned()))?;

        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        let skew = now.saturating_sub(ts);
        if skew.saturating_abs() > max_age {
            return Err(SignatureError::StaleTimestamp { skew_secs: skew });
        }

        let digest = signature
            .strip_prefix("v0=")
            .and_then(|hex_digest| hex::decode(hex_digest).ok())
            .ok_or(SignatureError::Malformed)?;

        // verify_slice compares in constant time
        self.mac_for(timestamp, body)
            .verify_slice(&digest)
            .map_err(|_| SignatureError::Mismatch)?;

        debug!("Slack signature verified");

        Ok(())
    }

    /// Compute the `X-Slack-Signature` value for a timestamp and body.
    #[must_use]
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> String {
        let digest = self.mac_for(timestamp, body).finalize().into_bytes();
        format!("{VERSION}={}", hex::encode(digest))
    }

    fn mac_for(&self, timestamp: &str, body: &[u8]) -> HmacSha256 {
        // HMAC accepts keys of any length, so this cannot fail
        #[allow(clippy::expect_used)]
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.expose_secret().as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(VERSION.as_bytes());
        mac.update(b":");
        mac.update(timestamp.as_bytes());
        mac.update(b":");
        mac.update(body);
        mac
    }
}

/// Current Unix time in seconds.
///
/// # Errors
///
/// Returns an error if the system clock is before the epoch.
pub fn unix_now() -> Result<i64, SignatureError> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|_| SignatureError::Clock)?
        .as_secs();
    i64::try_from(secs).map_err(|_| SignatureError::Clock)
}
