//! Gateway (WebSocket) transport for the Discord API (§4.E).
//!
//! This module owns the connection lifecycle: connect, HELLO, identify or
//! resume, heartbeat, reconnect with backoff, session resumption, and
//! close-code classification. Callers consume a stream of [`GatewayEvent`]
//! values without touching `tokio_tungstenite` directly.

pub mod backoff;
pub mod close;
pub mod driver;
pub mod event;
pub mod state;

pub use driver::{connect, GatewayHandle};
pub use event::{GatewayEvent, ParseFailure};
pub use state::{ConnectionState, HeartbeatState, SessionState};
