//! Per-connection state (§3): connection lifecycle, session resumption
//! data, and heartbeat bookkeeping. Grounded in the teacher's `SessionState`
//! in `gateway.rs`, split out and extended with the full state machine and
//! heartbeat-zombie tracking the distilled spec calls for.

use std::time::Instant;

/// Lifecycle states a single gateway connection passes through (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    AwaitingHello,
    Identifying,
    Resuming,
    Connected,
    Closing,
    /// Terminal: reconnect is forbidden for this connection.
    Stopped,
}

/// Session-resumption data, carried across reconnects within a session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub session_id: Option<String>,
    pub resume_gateway_url: Option<String>,
    pub sequence: Option<u64>,
}

impl SessionState {
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.sequence.is_some()
    }

    /// Drop session identity but keep the resume URL, for a forced
    /// re-identify (close codes 4007/4009, op-9 non-resumable).
    pub fn clear_for_reidentify(&mut self) {
        self.session_id = None;
        self.sequence = None;
    }
}

/// Heartbeat timing state (§3). A zombie link is declared when a heartbeat
/// was sent but never acknowledged before the next one is due.
#[derive(Debug, Clone)]
pub struct HeartbeatState {
    pub last_sent_at: Option<Instant>,
    pub last_ack_at: Option<Instant>,
}

impl HeartbeatState {
    pub fn new() -> Self {
        Self {
            last_sent_at: None,
            last_ack_at: None,
        }
    }

    pub fn record_sent(&mut self) {
        self.last_sent_at = Some(Instant::now());
    }

    pub fn record_ack(&mut self) {
        self.last_ack_at = Some(Instant::now());
    }

    /// True once a heartbeat has been sent without an intervening ack.
    pub fn is_zombie(&self) -> bool {
        match (self.last_sent_at, self.last_ack_at) {
            (Some(sent), Some(ack)) => sent > ack,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

impl Default for HeartbeatState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_cannot_resume() {
        assert!(!SessionState::default().can_resume());
    }

    #[test]
    fn session_with_id_and_sequence_can_resume() {
        let session = SessionState {
            session_id: Some("abc".to_string()),
            resume_gateway_url: None,
            sequence: Some(5),
        };
        assert!(session.can_resume());
    }

    #[test]
    fn clear_for_reidentify_keeps_resume_url() {
        let mut session = SessionState {
            session_id: Some("abc".to_string()),
            resume_gateway_url: Some("wss://example".to_string()),
            sequence: Some(5),
        };
        session.clear_for_reidentify();
        assert!(session.session_id.is_none());
        assert!(session.sequence.is_none());
        assert!(session.resume_gateway_url.is_some());
    }

    #[test]
    fn fresh_heartbeat_state_is_not_zombie() {
        assert!(!HeartbeatState::new().is_zombie());
    }

    #[test]
    fn sent_without_ack_is_zombie() {
        let mut hb = HeartbeatState::new();
        hb.record_sent();
        assert!(hb.is_zombie());
    }

    #[test]
    fn ack_after_send_clears_zombie() {
        let mut hb = HeartbeatState::new();
        hb.record_sent();
        hb.record_ack();
        assert!(!hb.is_zombie());
    }
}
