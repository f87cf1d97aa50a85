//! Process-wide configuration: API version, per-connection gateway options,
//! and sharding options (§6, §9.3).

use std::time::Duration;

use crate::http::retry::RetryPolicy;
use crate::intents::Intents;
use crate::token::Token;

/// Bot API version, read once at startup (§6: "a process-wide constant read
/// from configuration").
pub const API_VERSION: u8 = 10;

/// Presence update sent on identify/resume.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Presence {
    pub since: Option<u64>,
    pub status: String,
    pub afk: bool,
}

/// Options for connecting a single gateway shard.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub token: Token,
    pub intents: Intents,
    pub shard_id: u32,
    pub shard_count: u32,
    pub presence: Option<Presence>,
    /// Timeout waiting for HELLO/the initial connection handshake.
    pub handshake_timeout: Duration,
    /// Timeout waiting for READY after an IDENTIFY/RESUME is sent.
    pub identify_timeout: Duration,
}

impl GatewayConfig {
    pub fn new(token: impl Into<Token>, intents: Intents) -> Self {
        Self {
            token: token.into(),
            intents,
            shard_id: 0,
            shard_count: 1,
            presence: None,
            handshake_timeout: Duration::from_secs(30),
            identify_timeout: Duration::from_secs(60),
        }
    }

    pub fn shard(mut self, shard_id: u32, shard_count: u32) -> Self {
        self.shard_id = shard_id;
        self.shard_count = shard_count;
        self
    }

    pub fn presence(mut self, presence: Presence) -> Self {
        self.presence = Some(presence);
        self
    }
}

/// How many shards to run, and how to discover that number.
#[derive(Debug, Clone)]
pub enum ShardCount {
    Exact(u32),
    /// Ask Discord's `/gateway/bot` endpoint, which also returns the
    /// `max_concurrency` identify gate (§4.F).
    Auto,
}

/// Options for the [`crate::shard::ShardManager`] coordinator.
#[derive(Debug, Clone)]
pub struct ShardingConfig {
    pub token: Token,
    pub intents: Intents,
    pub shard_count: ShardCount,
    pub presence: Option<Presence>,
}

impl ShardingConfig {
    pub fn new(token: impl Into<Token>, intents: Intents, shard_count: ShardCount) -> Self {
        Self {
            token: token.into(),
            intents,
            shard_count,
            presence: None,
        }
    }
}

/// Options for the HTTP client core (§4.D, §9.3).
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub token: Token,
    pub request_timeout: Duration,
    pub cache_enabled: bool,
    /// The configurable retry policy (§4.C): retryable statuses, retry cap,
    /// whether transport errors earn a retry, and the fallback backoff.
    pub retry: RetryPolicy,
}

impl HttpConfig {
    pub fn new(token: impl Into<Token>) -> Self {
        Self {
            token: token.into(),
            request_timeout: Duration::from_secs(30),
            cache_enabled: false,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
