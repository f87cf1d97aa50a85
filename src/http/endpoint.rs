//! The endpoint contract (§6) the HTTP core consumes.
//!
//! The full ~170-variant REST catalog is a codegen concern external to this
//! crate (§9 design notes: "prefer codegen from the OpenAPI document").
//! What's here is a representative sample — messages, channels, guilds,
//! interactions, application commands — enough to exercise every path the
//! client core takes (auth, global-limit membership, cacheable identity,
//! webhook-token redaction).

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::model::id::{ApplicationMarker, ChannelMarker, GuildMarker, Id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// Collapses per-instance endpoints (e.g. `getChannel(id)` for any `id`) to
/// a single cache/rate-limit identity, per §6.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheableIdentity {
    GetChannel,
    GetGuild,
    GetMessages,
    GetGatewayBot,
}

/// An opaque endpoint value the HTTP core consumes (§3, §6). Each variant
/// carries only the path parameters that vary per call; the URL template,
/// method, and rate-limit/cache classification are fixed per variant.
#[derive(Debug, Clone)]
pub enum Endpoint {
    CreateMessage { channel_id: Id<ChannelMarker> },
    GetMessages { channel_id: Id<ChannelMarker> },
    GetChannel { channel_id: Id<ChannelMarker> },
    GetGuild { guild_id: Id<GuildMarker> },
    CreateInteractionResponse { interaction_id: u64, interaction_token: String },
    BulkOverwriteGlobalCommands { application_id: Id<ApplicationMarker> },
    /// Discovers the gateway WebSocket URL, recommended shard count, and
    /// `max_concurrency` identify gate (§4.F).
    GetGatewayBot,
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::CreateMessage { .. } => Method::Post,
            Endpoint::GetMessages { .. } => Method::Get,
            Endpoint::GetChannel { .. } => Method::Get,
            Endpoint::GetGuild { .. } => Method::Get,
            Endpoint::CreateInteractionResponse { .. } => Method::Post,
            Endpoint::BulkOverwriteGlobalCommands { .. } => Method::Put,
            Endpoint::GetGatewayBot => Method::Get,
        }
    }

    /// Path relative to `https://discord.com/api/v{API_VERSION}/`.
    pub fn path(&self) -> String {
        match self {
            Endpoint::CreateMessage { channel_id } | Endpoint::GetMessages { channel_id } => {
                format!("channels/{channel_id}/messages")
            }
            Endpoint::GetChannel { channel_id } => format!("channels/{channel_id}"),
            Endpoint::GetGuild { guild_id } => format!("guilds/{guild_id}"),
            Endpoint::CreateInteractionResponse {
                interaction_id,
                interaction_token,
            } => format!("interactions/{interaction_id}/{interaction_token}/callback"),
            Endpoint::BulkOverwriteGlobalCommands { application_id } => {
                format!("applications/{application_id}/commands")
            }
            Endpoint::GetGatewayBot => "gateway/bot".to_string(),
        }
    }

    /// The rate-limit route key (bucket-table lookup key before Discord
    /// tells us the real bucket via `X-RateLimit-Bucket`). Distinct from
    /// `path()` for parameterized endpoints: it must identify the *route*,
    /// not the specific resource, matching Discord's own bucket semantics.
    pub fn route_key(&self) -> String {
        match self {
            Endpoint::CreateMessage { channel_id } => {
                format!("POST /channels/{channel_id}/messages")
            }
            Endpoint::GetMessages { channel_id } => {
                format!("GET /channels/{channel_id}/messages")
            }
            Endpoint::GetChannel { channel_id } => format!("GET /channels/{channel_id}"),
            Endpoint::GetGuild { guild_id } => format!("GET /guilds/{guild_id}"),
            Endpoint::CreateInteractionResponse { .. } => "POST /interactions/callback".to_string(),
            Endpoint::BulkOverwriteGlobalCommands { application_id } => {
                format!("PUT /applications/{application_id}/commands")
            }
            Endpoint::GetGatewayBot => "GET /gateway/bot".to_string(),
        }
    }

    pub fn requires_auth(&self) -> bool {
        // Webhook-token endpoints (not modeled in this sample catalog) are
        // the only `false` case; everything here requires bot auth.
        !matches!(self, Endpoint::CreateInteractionResponse { .. } if false)
    }

    /// Whether this endpoint counts against the global per-second limit.
    /// Interaction callbacks are exempt (§6).
    pub fn counts_against_global_limit(&self) -> bool {
        !matches!(self, Endpoint::CreateInteractionResponse { .. })
    }

    pub fn cacheable_identity(&self) -> Option<CacheableIdentity> {
        match self {
            Endpoint::GetChannel { .. } => Some(CacheableIdentity::GetChannel),
            Endpoint::GetGuild { .. } => Some(CacheableIdentity::GetGuild),
            Endpoint::GetMessages { .. } => Some(CacheableIdentity::GetMessages),
            Endpoint::GetGatewayBot => Some(CacheableIdentity::GetGatewayBot),
            _ => None,
        }
    }

    /// A log-safe identifier for this endpoint: parameters that could be
    /// secrets (webhook/interaction tokens) are hashed rather than included
    /// verbatim, per §6's "webhook tokens are omitted from `url_description`
    /// via hashing so they don't leak into logs".
    pub fn url_description(&self) -> String {
        match self {
            Endpoint::CreateInteractionResponse {
                interaction_id,
                interaction_token,
            } => format!(
                "interactions/{interaction_id}/{}/callback",
                short_hash(interaction_token)
            ),
            other => other.path(),
        }
    }
}

fn short_hash(secret: &str) -> String {
    let mut hasher = DefaultHasher::new();
    secret.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_description_hashes_webhook_tokens() {
        let endpoint = Endpoint::CreateInteractionResponse {
            interaction_id: 1,
            interaction_token: "super-secret-interaction-token".to_string(),
        };
        let description = endpoint.url_description();
        assert!(!description.contains("super-secret-interaction-token"));
        assert!(description.starts_with("interactions/1/"));
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(short_hash("abc"), short_hash("abc"));
        assert_ne!(short_hash("abc"), short_hash("abd"));
    }

    #[test]
    fn interaction_callback_exempt_from_global_limit() {
        let endpoint = Endpoint::CreateInteractionResponse {
            interaction_id: 1,
            interaction_token: "t".into(),
        };
        assert!(!endpoint.counts_against_global_limit());
        assert!(Endpoint::GetGuild { guild_id: Id::new(1) }.counts_against_global_limit());
    }

    #[test]
    fn per_instance_endpoints_collapse_to_one_cache_identity() {
        let a = Endpoint::GetChannel { channel_id: Id::new(1) };
        let b = Endpoint::GetChannel { channel_id: Id::new(2) };
        assert_eq!(a.cacheable_identity(), b.cacheable_identity());
    }
}
