//! Close-code classification (§4.E's action table): what a gateway close
//! frame means for the connection's next step.

/// What a connection should do after receiving a given WebSocket close code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    /// Reconnect and attempt RESUME (session state preserved).
    Resume,
    /// Reconnect, but discard session state and send a fresh IDENTIFY.
    Reidentify,
    /// Do not reconnect. The connection is permanently done.
    Terminal,
}

/// A human-readable reason, used for logging. `None` for the generic
/// "unknown close code, try to resume" case.
pub fn describe(code: u16) -> Option<&'static str> {
    match code {
        4004 => Some("authenticationFailed"),
        4010 => Some("invalidShard"),
        4011 => Some("shardingRequired"),
        4012 => Some("invalidApiVersion"),
        4013 => Some("invalidIntents"),
        4014 => Some("disallowedIntents"),
        4007 => Some("invalidSeq"),
        4009 => Some("sessionTimedOut"),
        4008 => Some("rateLimited"),
        _ => None,
    }
}

/// Classify a WebSocket close code per the action table.
pub fn classify(code: u16) -> CloseAction {
    match code {
        4004 | 4010 | 4011 | 4012 | 4013 | 4014 => CloseAction::Terminal,
        4009 => CloseAction::Reidentify,
        // 4006 "session no longer valid" is handled one layer up: RESUME is
        // attempted once, and a second consecutive failure there falls back
        // to a fresh identify rather than retrying resume indefinitely.
        // 4007 is a plain reconnect-with-resume per the action table, same
        // bucket as 1000/1001/4000-4005.
        1000 | 1001 | 4000..=4008 => CloseAction::Resume,
        _ => CloseAction::Resume,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_is_terminal() {
        assert_eq!(classify(4004), CloseAction::Terminal);
    }

    #[test]
    fn invalid_intents_is_terminal() {
        assert_eq!(classify(4013), CloseAction::Terminal);
        assert_eq!(classify(4014), CloseAction::Terminal);
    }

    #[test]
    fn session_timed_out_reidentifies() {
        assert_eq!(classify(4009), CloseAction::Reidentify);
    }

    #[test]
    fn invalid_seq_resumes_rather_than_reidentifies() {
        assert_eq!(classify(4007), CloseAction::Resume);
    }

    #[test]
    fn unknown_codes_default_to_resume() {
        assert_eq!(classify(1000), CloseAction::Resume);
        assert_eq!(classify(4200), CloseAction::Resume);
    }

    #[test]
    fn descriptions_exist_for_terminal_codes() {
        assert_eq!(describe(4004), Some("authenticationFailed"));
        assert_eq!(describe(1000), None);
    }
}
