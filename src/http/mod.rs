//! The HTTP client core (§4.D): orchestrates rate limiting, caching, and
//! retries around a `reqwest::Client`. Grounded in the teacher's
//! `DiscordHttpClient::request`/`request_json` pipeline in `src/http.rs`,
//! with `beet`'s HTTP abstraction replaced by `reqwest` (see DESIGN.md).

pub mod cache;
pub mod endpoint;
pub mod error;
pub mod rate_limit;
pub mod retry;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{HttpConfig, API_VERSION};
use crate::token::Token;

use self::cache::ResponseCache;
use self::endpoint::Endpoint;
use self::error::HttpError;
use self::rate_limit::{ParsedRateLimitHeaders, RateLimiter};
use self::retry::{Backoff, RetryPolicy};

const BASE_URL: &str = "https://discord.com/api";

/// The Discord REST client. One instance is expected to be shared (behind
/// an `Arc`, or simply cloned — every field is internally shared) across a
/// whole shard group, since the rate limiter's state is only meaningful
/// when every outgoing request passes through it.
#[derive(Clone)]
pub struct HttpClient {
    token: Token,
    inner: reqwest::Client,
    limiter: std::sync::Arc<RateLimiter>,
    cache: std::sync::Arc<ResponseCache>,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        let inner = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Ok(Self {
            token: config.token,
            inner,
            limiter: std::sync::Arc::new(RateLimiter::new()),
            cache: std::sync::Arc::new(ResponseCache::new(config.cache_enabled)),
            retry: config.retry,
        })
    }

    fn url_for(&self, endpoint: &Endpoint) -> String {
        format!("{BASE_URL}/v{API_VERSION}/{}", endpoint.path())
    }

    /// Send a request and return the raw response body, following §4.D's
    /// pipeline: rate-limit gate, cache lookup (GET only), send, observe
    /// rate-limit headers, retry on retryable statuses, cache store.
    ///
    /// `queries` are ordered key/value pairs appended to the URL and used
    /// verbatim as part of the cache key, so e.g. `GetMessages` pagination
    /// (`before`/`after`/`limit`) doesn't collide with an unrelated page of
    /// the same channel.
    pub async fn request(
        &self,
        endpoint: Endpoint,
        queries: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<String, HttpError> {
        let query_string = encode_query_key(queries);

        if let Some(identity) = endpoint.cacheable_identity() {
            if let Some(cached) = self.cache.get(&identity, &query_string).await {
                debug!(endpoint = %endpoint.url_description(), "cache hit");
                return Ok(cached);
            }
        }

        let mut attempt = 0u32;
        let mut transport_retried = false;
        loop {
            if self.limiter.wait_before_request(&endpoint).await.is_some() {
                return Err(HttpError::RateLimited {
                    endpoint: endpoint.url_description(),
                });
            }

            let mut request = self
                .inner
                .request(reqwest_method(endpoint.method()), self.url_for(&endpoint))
                .query(queries);
            if endpoint.requires_auth() {
                request = request.header("Authorization", self.token.authorization_header());
            }
            if let Some(ref json_body) = body {
                request = request.json(json_body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    if self.retry.retry_connection_errors && !transport_retried {
                        transport_retried = true;
                        warn!(error = %e, endpoint = %endpoint.url_description(), "transport error, retrying once");
                        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
                        continue;
                    }
                    return Err(HttpError::Transport(e.to_string()));
                }
            };

            let status = response.status().as_u16();
            let headers = ParsedRateLimitHeaders::from_header_map(response.headers());
            self.limiter.observe(&endpoint, &headers, status).await;

            let response_body = response
                .text()
                .await
                .map_err(|e| HttpError::Transport(e.to_string()))?;

            debug!(status, endpoint = %endpoint.url_description(), "Discord API response");

            if (200..300).contains(&status) {
                if let Some(identity) = endpoint.cacheable_identity() {
                    self.cache.put(identity, &query_string, response_body.clone()).await;
                }
                return Ok(response_body);
            }

            if self.retry.should_retry(status, attempt) {
                let backoff = Backoff::RetryAfterHeader {
                    retry_after: headers.retry_after,
                    fallback: Box::new(self.retry.backoff.clone()),
                };
                let delay = backoff.delay(attempt + 1);
                warn!(
                    status,
                    attempt,
                    endpoint = %endpoint.url_description(),
                    ?delay,
                    "retrying Discord API request"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(HttpError::Api {
                status,
                body: response_body,
                route: endpoint.url_description(),
            });
        }
    }

    /// `request`, then deserialize the body as JSON.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        queries: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<T, HttpError> {
        let raw = self.request(endpoint, queries, body).await?;
        serde_json::from_str(&raw).map_err(|e| HttpError::Serde(e.to_string()))
    }

    /// Periodically sweep expired cache entries. Intended to be spawned as
    /// a background task by the owner of this client.
    pub async fn run_cache_sweeper(&self, interval: std::time::Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            self.cache.sweep().await;
        }
    }
}

fn reqwest_method(method: endpoint::Method) -> reqwest::Method {
    match method {
        endpoint::Method::Get => reqwest::Method::GET,
        endpoint::Method::Post => reqwest::Method::POST,
        endpoint::Method::Put => reqwest::Method::PUT,
        endpoint::Method::Patch => reqwest::Method::PATCH,
        endpoint::Method::Delete => reqwest::Method::DELETE,
    }
}

/// The cache's `query` half of its `(identity, query)` key: the ordered
/// pairs joined verbatim, matching the order the caller supplied (§3 calls
/// for "ordered query pairs", not a canonicalized/sorted form).
fn encode_query_key(queries: &[(&str, &str)]) -> String {
    queries
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_key_is_empty_for_no_queries() {
        assert_eq!(encode_query_key(&[]), "");
    }

    #[test]
    fn query_key_preserves_caller_order() {
        assert_eq!(
            encode_query_key(&[("before", "1"), ("limit", "50")]),
            "before=1&limit=50"
        );
    }
}
