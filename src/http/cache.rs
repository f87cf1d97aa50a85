//! TTL response cache (§4.B): off by default, 5s default TTL when enabled,
//! keyed by (endpoint identity, query parameters), with per-identity TTL
//! overrides (e.g. gateway discovery cached for an hour). Not modeled in the
//! teacher's HTTP layer at all — grounded instead in §4.B and sized to its
//! stated scope (no cache of gateway-dispatched events, no persistence).

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::endpoint::CacheableIdentity;

pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// §4.B's worked example: the gateway-bot discovery response changes rarely
/// enough to cache for an hour rather than the 5s default.
const GATEWAY_BOT_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct CacheKey {
    identity: CacheableIdentity,
    query: String,
}

struct CacheEntry {
    body: String,
    expires_at: Instant,
}

/// A small in-memory TTL cache for idempotent GET responses.
pub struct ResponseCache {
    enabled: bool,
    default_ttl: Duration,
    overrides: HashMap<CacheableIdentity, Duration>,
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl ResponseCache {
    pub fn new(enabled: bool) -> Self {
        Self::with_ttl(enabled, DEFAULT_TTL)
    }

    pub fn with_ttl(enabled: bool, default_ttl: Duration) -> Self {
        let mut overrides = HashMap::new();
        overrides.insert(CacheableIdentity::GetGatewayBot, GATEWAY_BOT_TTL);
        Self {
            enabled,
            default_ttl,
            overrides,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// The TTL that applies to a given identity: its override if one is
    /// registered, else the cache's default.
    pub fn ttl_for(&self, identity: &CacheableIdentity) -> Duration {
        self.overrides.get(identity).copied().unwrap_or(self.default_ttl)
    }

    /// Register (or replace) a per-identity TTL override.
    pub fn set_ttl_override(&mut self, identity: CacheableIdentity, ttl: Duration) {
        self.overrides.insert(identity, ttl);
    }

    /// Look up a cached body for this identity/query, evicting it first if
    /// it has expired.
    pub async fn get(&self, identity: &CacheableIdentity, query: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let key = CacheKey {
            identity: identity.clone(),
            query: query.to_string(),
        };
        let mut entries = self.entries.lock().await;
        match entries.get(&key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.body.clone()),
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub async fn put(&self, identity: CacheableIdentity, query: &str, body: String) {
        if !self.enabled {
            return;
        }
        let ttl = self.ttl_for(&identity);
        let key = CacheKey {
            identity,
            query: query.to_string(),
        };
        self.entries.lock().await.insert(
            key,
            CacheEntry {
                body,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop all expired entries. Intended to be called periodically by a
    /// background task rather than on every request.
    pub async fn sweep(&self) {
        let now = Instant::now();
        self.entries.lock().await.retain(|_, entry| entry.expires_at > now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_cache_never_stores() {
        let cache = ResponseCache::new(false);
        cache
            .put(CacheableIdentity::GetGuild, "", "body".to_string())
            .await;
        assert_eq!(cache.get(&CacheableIdentity::GetGuild, "").await, None);
    }

    #[tokio::test]
    async fn enabled_cache_round_trips_within_ttl() {
        let cache = ResponseCache::with_ttl(true, Duration::from_secs(60));
        cache
            .put(CacheableIdentity::GetGuild, "g=1", "body".to_string())
            .await;
        assert_eq!(
            cache.get(&CacheableIdentity::GetGuild, "g=1").await,
            Some("body".to_string())
        );
    }

    #[tokio::test]
    async fn distinct_query_strings_do_not_collide() {
        let cache = ResponseCache::with_ttl(true, Duration::from_secs(60));
        cache
            .put(CacheableIdentity::GetMessages, "limit=1", "a".to_string())
            .await;
        cache
            .put(CacheableIdentity::GetMessages, "limit=2", "b".to_string())
            .await;
        assert_eq!(
            cache.get(&CacheableIdentity::GetMessages, "limit=1").await,
            Some("a".to_string())
        );
        assert_eq!(
            cache.get(&CacheableIdentity::GetMessages, "limit=2").await,
            Some("b".to_string())
        );
    }

    #[tokio::test]
    async fn expired_entry_is_evicted_on_read() {
        let cache = ResponseCache::with_ttl(true, Duration::from_millis(1));
        cache
            .put(CacheableIdentity::GetChannel, "", "body".to_string())
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get(&CacheableIdentity::GetChannel, "").await, None);
    }

    #[tokio::test]
    async fn gateway_bot_identity_gets_hour_long_default_override() {
        let cache = ResponseCache::with_ttl(true, Duration::from_secs(5));
        assert_eq!(
            cache.ttl_for(&CacheableIdentity::GetGatewayBot),
            Duration::from_secs(3600)
        );
        assert_eq!(cache.ttl_for(&CacheableIdentity::GetGuild), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn custom_override_replaces_default_ttl() {
        let mut cache = ResponseCache::with_ttl(true, Duration::from_secs(5));
        cache.set_ttl_override(CacheableIdentity::GetGuild, Duration::from_secs(30));
        assert_eq!(cache.ttl_for(&CacheableIdentity::GetGuild), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn sweep_removes_expired_entries() {
        let cache = ResponseCache::with_ttl(true, Duration::from_millis(1));
        cache
            .put(CacheableIdentity::GetChannel, "", "body".to_string())
            .await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.sweep().await;
        assert_eq!(cache.entries.lock().await.len(), 0);
    }
}
