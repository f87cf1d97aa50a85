//! Rate limiting (§4.A): per-bucket tracking from `X-RateLimit-*` response
//! headers, plus the shared global per-second bucket. Grounded in the
//! teacher's `RateLimiter`/`BucketState`/`parse_rate_limit_headers`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use super::endpoint::Endpoint;

#[derive(Debug, Clone)]
struct BucketState {
    remaining: u32,
    reset_at: Instant,
}

/// Tracks Discord's per-route buckets plus the account-wide global bucket.
pub struct RateLimiter {
    /// route key (from `Endpoint::route_key`) -> Discord bucket id, once
    /// learned from a response's `X-RateLimit-Bucket` header.
    route_buckets: Mutex<HashMap<String, String>>,
    /// bucket id -> current state.
    buckets: Mutex<HashMap<String, BucketState>>,
    /// Set while the account-wide global limit is exhausted.
    global_until: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            route_buckets: Mutex::new(HashMap::new()),
            buckets: Mutex::new(HashMap::new()),
            global_until: Mutex::new(None),
        }
    }

    /// Pre-emptive check: how long the caller should wait before sending,
    /// if anything. `None` means send now — and, per §4.A ("otherwise
    /// decrements optimistically"), this call also locally decrements the
    /// bucket's `remaining` count so concurrent callers sharing this
    /// limiter (e.g. a whole shard group behind one cloned `HttpClient`)
    /// see each other's in-flight requests before any response headers
    /// come back.
    pub async fn wait_before_request(&self, endpoint: &Endpoint) -> Option<Duration> {
        let now = Instant::now();

        if endpoint.counts_against_global_limit() {
            if let Some(until) = *self.global_until.lock().await {
                if until > now {
                    return Some(until - now);
                }
            }
        }

        let bucket_id = {
            let route_buckets = self.route_buckets.lock().await;
            route_buckets.get(endpoint.route_key().as_str()).cloned()
        };
        let Some(bucket_id) = bucket_id else {
            return None;
        };
        let mut buckets = self.buckets.lock().await;
        let Some(state) = buckets.get_mut(&bucket_id) else {
            return None;
        };
        if state.remaining == 0 && state.reset_at > now {
            return Some(state.reset_at - now);
        }
        state.remaining = state.remaining.saturating_sub(1);
        None
    }

    /// Record what a response told us about the bucket it used.
    pub async fn observe(&self, endpoint: &Endpoint, headers: &ParsedRateLimitHeaders, status: u16) {
        if status == 429 {
            if headers.global {
                let until = Instant::now()
                    + headers.retry_after.unwrap_or(Duration::from_secs(1));
                *self.global_until.lock().await = Some(until);
                debug!(?until, "global rate limit exhausted");
            }
        }

        let Some(bucket_id) = headers.bucket.clone() else {
            return;
        };
        self.route_buckets
            .lock()
            .await
            .insert(endpoint.route_key(), bucket_id.clone());

        if let (Some(remaining), Some(reset_after)) = (headers.remaining, headers.reset_after) {
            let state = BucketState {
                remaining,
                reset_at: Instant::now() + reset_after,
            };
            self.buckets.lock().await.insert(bucket_id, state);
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Values lifted out of a response's `X-RateLimit-*` headers.
#[derive(Debug, Clone, Default)]
pub struct ParsedRateLimitHeaders {
    pub bucket: Option<String>,
    pub remaining: Option<u32>,
    pub reset_after: Option<Duration>,
    pub retry_after: Option<Duration>,
    pub global: bool,
}

impl ParsedRateLimitHeaders {
    pub fn from_header_map(headers: &reqwest::header::HeaderMap) -> Self {
        let header_str = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

        Self {
            bucket: header_str("x-ratelimit-bucket").map(str::to_string),
            remaining: header_str("x-ratelimit-remaining").and_then(|v| v.parse().ok()),
            reset_after: header_str("x-ratelimit-reset-after")
                .and_then(|v| v.parse::<f64>().ok())
                .map(Duration::from_secs_f64),
            retry_after: header_str("retry-after")
                .and_then(|v| v.parse::<f64>().ok())
                .map(Duration::from_secs_f64),
            global: header_str("x-ratelimit-global").is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::Id;

    fn guild_endpoint() -> Endpoint {
        Endpoint::GetGuild { guild_id: Id::new(1) }
    }

    #[tokio::test]
    async fn fresh_limiter_allows_immediately() {
        let limiter = RateLimiter::new();
        assert!(limiter.wait_before_request(&guild_endpoint()).await.is_none());
    }

    #[tokio::test]
    async fn exhausted_bucket_blocks_until_reset() {
        let limiter = RateLimiter::new();
        let endpoint = guild_endpoint();
        let headers = ParsedRateLimitHeaders {
            bucket: Some("b1".to_string()),
            remaining: Some(0),
            reset_after: Some(Duration::from_secs(5)),
            retry_after: None,
            global: false,
        };
        limiter.observe(&endpoint, &headers, 200).await;
        let wait = limiter.wait_before_request(&endpoint).await;
        assert!(wait.is_some());
        assert!(wait.unwrap() <= Duration::from_secs(5));
    }

    #[tokio::test]
    async fn global_exhaustion_blocks_global_counted_endpoints() {
        let limiter = RateLimiter::new();
        let endpoint = guild_endpoint();
        let headers = ParsedRateLimitHeaders {
            bucket: None,
            remaining: None,
            reset_after: None,
            retry_after: Some(Duration::from_secs(2)),
            global: true,
        };
        limiter.observe(&endpoint, &headers, 429).await;
        assert!(limiter.wait_before_request(&endpoint).await.is_some());
    }

    #[tokio::test]
    async fn wait_before_request_decrements_optimistically() {
        let limiter = RateLimiter::new();
        let endpoint = guild_endpoint();
        let headers = ParsedRateLimitHeaders {
            bucket: Some("b1".to_string()),
            remaining: Some(1),
            reset_after: Some(Duration::from_secs(5)),
            retry_after: None,
            global: false,
        };
        limiter.observe(&endpoint, &headers, 200).await;

        // First in-flight caller consumes the last known-remaining slot
        // locally, before any new response headers arrive.
        assert!(limiter.wait_before_request(&endpoint).await.is_none());
        // A second concurrent caller sees the optimistic decrement and is
        // throttled, rather than also sailing through on stale state.
        assert!(limiter.wait_before_request(&endpoint).await.is_some());
    }

    #[tokio::test]
    async fn non_global_endpoint_ignores_global_exhaustion() {
        let limiter = RateLimiter::new();
        let counted = guild_endpoint();
        let headers = ParsedRateLimitHeaders {
            bucket: None,
            remaining: None,
            reset_after: None,
            retry_after: Some(Duration::from_secs(2)),
            global: true,
        };
        limiter.observe(&counted, &headers, 429).await;

        let exempt = Endpoint::CreateInteractionResponse {
            interaction_id: 1,
            interaction_token: "t".into(),
        };
        assert!(limiter.wait_before_request(&exempt).await.is_none());
    }
}
