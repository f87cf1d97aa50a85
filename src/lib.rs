//! A Discord bot client library: a self-healing gateway connection, a
//! sharding coordinator, and a rate-limited, cached, retrying HTTP client
//! core.
//!
//! Start with [`config::GatewayConfig`] and [`gateway::connect`] for a
//! single connection, or [`config::ShardingConfig`] and
//! [`shard::ShardManager::start`] to run a full shard group behind one
//! merged event stream. Use [`http::HttpClient`] for REST calls; both
//! share the [`token::Token`] and [`intents::Intents`] types.

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod intents;
pub mod model;
pub mod multiplex;
pub mod shard;
pub mod token;

pub use config::{GatewayConfig, HttpConfig, ShardCount, ShardingConfig};
pub use error::{GatewayError, ShardError};
pub use gateway::{GatewayEvent, GatewayHandle};
pub use http::HttpClient;
pub use intents::Intents;
pub use shard::ShardManager;
pub use token::Token;
