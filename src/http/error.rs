//! HTTP client error taxonomy (§7).

use std::fmt;

#[derive(Debug)]
pub enum HttpError {
    /// A pre-emptive rate-limit denial from §4.A — no network send happened.
    RateLimited { endpoint: String },
    /// Non-2xx status from Discord that the retry engine decided not to
    /// retry (client error, or a retryable status that ran out of
    /// attempts).
    Api {
        status: u16,
        body: String,
        route: String,
    },
    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    Transport(String),
    /// Response body did not deserialize as the expected type.
    Serde(String),
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::RateLimited { endpoint } => {
                write!(f, "rate limited before send: {endpoint}")
            }
            HttpError::Api { status, body, route } => {
                write!(f, "Discord API error {status} on {route}: {body}")
            }
            HttpError::Transport(e) => write!(f, "HTTP transport error: {e}"),
            HttpError::Serde(e) => write!(f, "response deserialization error: {e}"),
        }
    }
}

impl std::error::Error for HttpError {}
