//! Sign a request body the way Slack does.
//!
//! Prints the two headers for use with curl against a local server:
//!
//! ```bash
//! slash-relay-cli sign --body "$BODY"
//! ```
//!
//! # Environment Variables
//!
//! - `SLACK_SIGNING_SECRET` - Same secret the server verifies with

use slash_relay_server::config::signing_secret_from_env;
use slash_relay_server::slack::{SIGNATURE_HEADER, SignatureVerifier, TIMESTAMP_HEADER, unix_now};

use super::CommandError;

/// Print signature headers for `body`.
///
/// # Errors
///
/// Returns error if the signing secret is unset or the clock is unusable.
pub fn run(body: &str, timestamp: Option<i64>) -> Result<(), CommandError> {
    let verifier = SignatureVerifier::new(signing_secret_from_env()?);
    let timestamp = match timestamp {
        Some(ts) => ts,
        None => unix_now()?,
    };

    #[allow(clippy::print_stdout)]
    for (name, value) in signed_headers(&verifier, timestamp, body) {
        println!("{name}: {value}");
    }

    Ok(())
}

/// Header name/value pairs that authenticate `body` at `timestamp`.
fn signed_headers(
    verifier: &SignatureVerifier,
    timestamp: i64,
    body: &str,
) -> [(&'static str, String); 2] {
    let timestamp = timestamp.to_string();
    let signature = verifier.sign(&timestamp, body.as_bytes());
    [(TIMESTAMP_HEADER, timestamp), (SIGNATURE_HEADER, signature)]
}
