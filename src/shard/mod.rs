//! Sharding coordinator (§4.F): manages N gateway connections under
//! Discord's max-concurrency identify gate, merges their event and
//! parse-failure streams, and routes outbound commands by guild.

pub mod route;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::{Presence, ShardCount, ShardingConfig};
use crate::error::ShardError;
use crate::gateway::{self, GatewayEvent, ParseFailure};
use crate::http::endpoint::Endpoint;
use crate::http::HttpClient;
use crate::model::id::{GuildMarker, Id};
use crate::multiplex::{Broadcaster, Subscriber, DEFAULT_CAPACITY};

pub use route::{shard_id_for_guild, ShardCommand};

/// Spacing Discord requires between identifies within the same
/// max-concurrency bucket.
const IDENTIFY_SPACING: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct GatewayBotResponse {
    url: String,
    shards: u32,
    session_start_limit: SessionStartLimit,
}

#[derive(Debug, Deserialize)]
struct SessionStartLimit {
    max_concurrency: u32,
}

/// Emitted when one shard's connection reaches `Stopped`. A terminal close
/// on one shard never terminates the others.
#[derive(Debug, Clone)]
pub struct ShardStopped {
    pub shard_id: u32,
}

/// Coordinates a group of gateway shards as a single logical connection.
pub struct ShardManager {
    pub events: Subscriber<GatewayEvent>,
    pub parse_failures: Subscriber<ParseFailure>,
    pub shard_stopped: Subscriber<ShardStopped>,
    shard_count: u32,
    senders: Arc<Mutex<HashMap<u32, tokio::sync::mpsc::Sender<serde_json::Value>>>>,
    _driver_handles: Vec<tokio::task::JoinHandle<()>>,
}

impl ShardManager {
    /// Discover (or accept a pinned) shard count and max_concurrency, then
    /// bring up every shard, gating identifies per §4.F.
    pub async fn start(config: ShardingConfig, http: &HttpClient) -> Result<Self, ShardError> {
        let discovery: GatewayBotResponse = http
            .request_json(Endpoint::GetGatewayBot, &[], None)
            .await
            .map_err(|e| ShardError::Discovery(e.to_string()))?;

        let shard_count = match config.shard_count {
            ShardCount::Exact(n) => n,
            ShardCount::Auto => discovery.shards,
        };
        let max_concurrency = discovery.session_start_limit.max_concurrency.max(1);

        info!(
            shard_count,
            max_concurrency,
            gateway_url = %discovery.url,
            "starting shard group"
        );

        let events = Broadcaster::new(DEFAULT_CAPACITY);
        let parse_failures = Broadcaster::new(DEFAULT_CAPACITY);
        let shard_stopped = Broadcaster::new(DEFAULT_CAPACITY);

        let events_sub = events.subscribe();
        let failures_sub = parse_failures.subscribe();
        let stopped_sub = shard_stopped.subscribe();

        let senders = Arc::new(Mutex::new(HashMap::new()));

        let mut buckets: Vec<Vec<u32>> = vec![Vec::new(); max_concurrency as usize];
        for shard_id in 0..shard_count {
            buckets[(shard_id % max_concurrency) as usize].push(shard_id);
        }

        let mut driver_handles = Vec::new();
        let mut bucket_tasks = Vec::new();

        for bucket in buckets {
            let token = config.token.clone();
            let intents = config.intents;
            let presence = config.presence.clone();
            let events = events.clone();
            let parse_failures = parse_failures.clone();
            let shard_stopped = shard_stopped.clone();
            let senders = Arc::clone(&senders);

            bucket_tasks.push(tokio::spawn(async move {
                let mut handles = Vec::new();
                for (i, shard_id) in bucket.into_iter().enumerate() {
                    if i > 0 {
                        tokio::time::sleep(IDENTIFY_SPACING).await;
                    }
                    let gw_config = build_gateway_config(&token, intents, shard_id, shard_count, presence.clone());
                    let handle = gateway::connect(gw_config).await;

                    senders.lock().await.insert(shard_id, handle.sender.clone());

                    handles.push(spawn_shard_pump(shard_id, handle, events.clone(), parse_failures.clone(), shard_stopped.clone()));
                }
                handles
            }));
        }

        for task in bucket_tasks {
            if let Ok(handles) = task.await {
                driver_handles.extend(handles);
            }
        }

        Ok(Self {
            events: events_sub,
            parse_failures: failures_sub,
            shard_stopped: stopped_sub,
            shard_count,
            senders,
            _driver_handles: driver_handles,
        })
    }

    /// Route a guild-scoped command to the shard that owns that guild.
    pub async fn send_to_guild(&self, guild_id: Id<GuildMarker>, payload: serde_json::Value) {
        self.dispatch(ShardCommand::Guild { guild_id, payload }).await;
    }

    /// Fan a command out to every shard (e.g. presence update).
    pub async fn broadcast(&self, payload: serde_json::Value) {
        self.dispatch(ShardCommand::Broadcast(payload)).await;
    }

    async fn dispatch(&self, command: ShardCommand) {
        match command {
            ShardCommand::Guild { guild_id, payload } => {
                let shard_id = shard_id_for_guild(guild_id, self.shard_count);
                if let Some(sender) = self.senders.lock().await.get(&shard_id) {
                    let _ = sender.send(payload).await;
                }
            }
            ShardCommand::Broadcast(payload) => {
                for sender in self.senders.lock().await.values() {
                    let _ = sender.send(payload.clone()).await;
                }
            }
        }
    }
}

fn build_gateway_config(
    token: &crate::token::Token,
    intents: crate::intents::Intents,
    shard_id: u32,
    shard_count: u32,
    presence: Option<Presence>,
) -> crate::config::GatewayConfig {
    let mut gw = crate::config::GatewayConfig::new(token.clone(), intents).shard(shard_id, shard_count);
    if let Some(presence) = presence {
        gw = gw.presence(presence);
    }
    gw
}

fn spawn_shard_pump(
    shard_id: u32,
    mut handle: gateway::GatewayHandle,
    events: Broadcaster<GatewayEvent>,
    parse_failures: Broadcaster<ParseFailure>,
    shard_stopped: Broadcaster<ShardStopped>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = handle.events.recv() => {
                    match event {
                        Some(event) => { events.publish(event); }
                        None => break,
                    }
                }
                failure = handle.parse_failures.recv() => {
                    match failure {
                        Some(failure) => { parse_failures.publish(failure); }
                        None => break,
                    }
                }
            }
        }
        let _ = handle.driver_handle.await;
        shard_stopped.publish(ShardStopped { shard_id });
    })
}
