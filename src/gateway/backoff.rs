//! Reconnect backoff (§7): exponential with jitter, base 1 s, capped at
//! 128 s. Ported from the teacher's `backoff_delay`, whose cap was 60 s —
//! widened here to the distilled spec's 128 s.

use std::time::Duration;

const BASE_MS: u64 = 1_000;
const CAP_MS: u64 = 128_000;

/// Delay before reconnect attempt number `attempt` (1-indexed).
pub fn reconnect_delay(attempt: u32) -> Duration {
    let scaled = BASE_MS.saturating_mul(1u64 << attempt.min(6));
    let jittered = (rand::random::<f64>() * 0.5 + 0.75) * scaled as f64;
    Duration::from_millis((jittered as u64).min(CAP_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_with_attempt() {
        let first = reconnect_delay(1);
        let later = reconnect_delay(5);
        assert!(later >= first);
    }

    #[test]
    fn delay_never_exceeds_cap() {
        for attempt in 0..20 {
            assert!(reconnect_delay(attempt) <= Duration::from_millis(CAP_MS));
        }
    }

    #[test]
    fn delay_is_never_zero() {
        assert!(reconnect_delay(0) > Duration::from_millis(0));
    }
}
