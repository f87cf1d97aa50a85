//! Typed gateway events (§4.E, §6). Ported from the grounding codebase's
//! `events.rs`: dispatch payloads are decoded into this enum so callers
//! pattern-match on strongly-typed data instead of raw `(op, t, Value)`
//! tuples. Unrecognised dispatch names become `Unknown` rather than a
//! parse failure — only a malformed envelope or a dispatch whose `d` fails
//! to deserialize as its known shape is surfaced on the parse-failure path.

use tracing::warn;

use crate::model::envelope::GatewayPayload;
use crate::model::guild::Guild;
use crate::model::interaction::Interaction;
use crate::model::message::Message;
use crate::model::presence::PresenceUpdate;
use crate::model::ready::ReadyEvent;

/// A fully-parsed event coming off the gateway.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Ready(ReadyEvent),
    GuildCreate(Guild),
    MessageCreate(Message),
    PresenceUpdate(PresenceUpdate),
    InteractionCreate(Interaction),
    /// Heartbeat ACK from the gateway (op 11).
    HeartbeatAck,
    /// The gateway is asking us to heartbeat immediately (op 1).
    HeartbeatRequest,
    /// Gateway requested a reconnect (op 7).
    Reconnect,
    /// Session invalidated (op 9). `true` if resumable.
    InvalidSession(bool),
    /// An event we received but don't have a typed variant for.
    Unknown {
        event_name: Option<String>,
        op: u8,
        data: Option<serde_json::Value>,
    },
}

/// A dispatch payload that failed to parse into its known shape, surfaced
/// on the parse-failure stream (§4.G) rather than silently dropped.
#[derive(Debug, Clone)]
pub struct ParseFailure {
    pub event_name: Option<String>,
    pub error: String,
}

impl GatewayEvent {
    /// Convert a raw envelope into a typed event. Returns `Err` only when
    /// a known dispatch name's payload fails to deserialize; everything
    /// else is infallible.
    pub fn from_payload(payload: GatewayPayload) -> Result<Self, ParseFailure> {
        match payload.op {
            0 => Self::parse_dispatch(payload.t, payload.d),
            1 => Ok(GatewayEvent::HeartbeatRequest),
            7 => Ok(GatewayEvent::Reconnect),
            9 => {
                let resumable = payload.d.as_ref().and_then(|v| v.as_bool()).unwrap_or(false);
                Ok(GatewayEvent::InvalidSession(resumable))
            }
            11 => Ok(GatewayEvent::HeartbeatAck),
            op => Ok(GatewayEvent::Unknown {
                event_name: payload.t,
                op,
                data: payload.d,
            }),
        }
    }

    fn parse_dispatch(
        event_name: Option<String>,
        data: Option<serde_json::Value>,
    ) -> Result<Self, ParseFailure> {
        let Some(name) = event_name else {
            return Ok(GatewayEvent::Unknown {
                event_name: None,
                op: 0,
                data,
            });
        };

        let Some(d) = data else {
            return Ok(GatewayEvent::Unknown {
                event_name: Some(name),
                op: 0,
                data: None,
            });
        };

        macro_rules! decode {
            ($variant:ident, $ty:ty) => {
                match serde_json::from_value::<$ty>(d.clone()) {
                    Ok(value) => Ok(GatewayEvent::$variant(value)),
                    Err(e) => {
                        warn!(event = %name, error = %e, "failed to parse dispatch payload");
                        Err(ParseFailure {
                            event_name: Some(name),
                            error: e.to_string(),
                        })
                    }
                }
            };
        }

        match name.as_str() {
            "READY" => decode!(Ready, ReadyEvent),
            "GUILD_CREATE" => decode!(GuildCreate, Guild),
            "MESSAGE_CREATE" => decode!(MessageCreate, Message),
            "PRESENCE_UPDATE" => decode!(PresenceUpdate, PresenceUpdate),
            "INTERACTION_CREATE" => decode!(InteractionCreate, Interaction),
            _ => Ok(GatewayEvent::Unknown {
                event_name: Some(name),
                op: 0,
                data: Some(d),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn heartbeat_ack_op_parses() {
        let payload = GatewayPayload {
            op: 11,
            d: None,
            s: None,
            t: None,
        };
        assert!(matches!(
            GatewayEvent::from_payload(payload),
            Ok(GatewayEvent::HeartbeatAck)
        ));
    }

    #[test]
    fn invalid_session_carries_resumable_flag() {
        let payload = GatewayPayload {
            op: 9,
            d: Some(json!(true)),
            s: None,
            t: None,
        };
        assert!(matches!(
            GatewayEvent::from_payload(payload),
            Ok(GatewayEvent::InvalidSession(true))
        ));
    }

    #[test]
    fn unknown_dispatch_name_becomes_unknown_variant() {
        let payload = GatewayPayload {
            op: 0,
            d: Some(json!({"foo": "bar"})),
            s: Some(1),
            t: Some("SOME_FUTURE_EVENT".to_string()),
        };
        assert!(matches!(
            GatewayEvent::from_payload(payload),
            Ok(GatewayEvent::Unknown { .. })
        ));
    }

    #[test]
    fn malformed_known_dispatch_is_a_parse_failure_not_a_panic() {
        let payload = GatewayPayload {
            op: 0,
            d: Some(json!({"not": "a ready event"})),
            s: Some(1),
            t: Some("READY".to_string()),
        };
        let result = GatewayEvent::from_payload(payload);
        assert!(result.is_err());
    }
}
