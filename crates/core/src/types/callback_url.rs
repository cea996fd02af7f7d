//! Callback URL type.

use core::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Errors that can occur when parsing a [`CallbackUrl`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CallbackUrlError {
    /// The input string is empty.
    #[error("callback URL cannot be empty")]
    Empty,
    /// The input string is not a URL.
    #[error("callback URL is malformed: {0}")]
    Malformed(String),
    /// The URL scheme is not `http` or `https`.
    #[error("callback URL must use http or https (got {0})")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("callback URL must have a host")]
    MissingHost,
}

/// A per-invocation endpoint for asynchronous replies.
///
/// Slack hands one of these out with every slash command as `response_url`.
/// Parsing guarantees it is an absolute `http` or `https` URL with a host;
/// whether it is reachable is only known once the notifier posts to it.
///
/// ## Examples
///
/// ```
/// use slash_relay_core::CallbackUrl;
///
/// assert!(CallbackUrl::parse("https://hooks.slack.com/commands/T1/1/abc").is_ok());
/// assert!(CallbackUrl::parse("http://127.0.0.1:8080/callback").is_ok());
///
/// assert!(CallbackUrl::parse("").is_err());
/// assert!(CallbackUrl::parse("ftp://example.com/file").is_err());
/// assert!(CallbackUrl::parse("not a url").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CallbackUrl(Url);

impl CallbackUrl {
    /// Parse a `CallbackUrl` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, is not an absolute URL, uses a
    /// scheme other than `http`/`https`, or has no host.
    pub fn parse(s: &str) -> Result<Self, CallbackUrlError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CallbackUrlError::Empty);
        }

        let url = Url::parse(s).map_err(|e| CallbackUrlError::Malformed(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => return Err(CallbackUrlError::UnsupportedScheme(other.to_owned())),
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(CallbackUrlError::MissingHost);
        }

        Ok(Self(url))
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the host portion, for logging without the secret path.
    #[must_use]
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or("")
    }
}

impl fmt::Display for CallbackUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl std::str::FromStr for CallbackUrl {
    type Err = CallbackUrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CallbackUrl {
    type Error = CallbackUrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CallbackUrl> for String {
    fn from(url: CallbackUrl) -> Self {
        url.0.into()
    }
}

impl AsRef<str> for CallbackUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
