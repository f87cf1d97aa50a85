//! The raw gateway payload envelope (§6: every WebSocket message is wrapped
//! in `{op, d, s, t}`). Twilight-style gateway crates hide this from
//! consumers entirely; since this crate drives the gateway itself, the
//! envelope is a first-class type.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Option<serde_json::Value>,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hello_payload() {
        let raw = r#"{"op":10,"d":{"heartbeat_interval":41250},"s":null,"t":null}"#;
        let payload: GatewayPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.op, 10);
        assert_eq!(
            payload.d.unwrap().get("heartbeat_interval").unwrap().as_u64(),
            Some(41250)
        );
    }

    #[test]
    fn parses_dispatch_with_sequence() {
        let raw = r#"{"op":0,"d":{},"s":42,"t":"GUILD_CREATE"}"#;
        let payload: GatewayPayload = serde_json::from_str(raw).unwrap();
        assert_eq!(payload.s, Some(42));
        assert_eq!(payload.t.as_deref(), Some("GUILD_CREATE"));
    }
}
