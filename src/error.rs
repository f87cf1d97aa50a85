//! Crate-level error types. Each subsystem gets its own enum with a manual
//! `Display`/`std::error::Error` impl, matching `HttpError` in the
//! grounding codebase's HTTP module rather than reaching for a derive macro
//! (see DESIGN.md for the rationale).

use std::fmt;

/// Errors surfaced by a single gateway connection's public API.
#[derive(Debug)]
pub enum GatewayError {
    /// The transport failed to connect at all.
    Connect(String),
    /// The transport closed or errored mid-session.
    Transport(String),
    /// HELLO (or READY, after identify/resume) did not arrive in time.
    Timeout(&'static str),
    /// The connection reached a terminal close code and will not reconnect.
    Terminal { code: u16, reason: String },
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Connect(e) => write!(f, "failed to connect to gateway: {e}"),
            GatewayError::Transport(e) => write!(f, "gateway transport error: {e}"),
            GatewayError::Timeout(what) => write!(f, "timed out waiting for {what}"),
            GatewayError::Terminal { code, reason } => {
                write!(f, "gateway closed terminally (code {code}): {reason}")
            }
        }
    }
}

impl std::error::Error for GatewayError {}

/// Errors surfaced by the sharding coordinator.
#[derive(Debug)]
pub enum ShardError {
    /// Fetching `/gateway/bot` to discover shard count / max_concurrency failed.
    Discovery(String),
    /// Per-shard gateway error, tagged with the shard that produced it.
    Shard { shard_id: u32, source: GatewayError },
}

impl fmt::Display for ShardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardError::Discovery(e) => write!(f, "shard count discovery failed: {e}"),
            ShardError::Shard { shard_id, source } => {
                write!(f, "shard {shard_id} error: {source}")
            }
        }
    }
}

impl std::error::Error for ShardError {}
