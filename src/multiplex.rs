//! Event multiplexer (§4.G): one producer, many subscribers. Each
//! subscriber's queue is bounded; a subscriber that falls more than
//! `capacity` events behind has its oldest entries dropped rather than
//! blocking the producer, with a warning logged so the drop is observable.
//!
//! `tokio::sync::broadcast` already implements "drop oldest on a full ring
//! buffer, tell the lagging receiver how many it missed" — this module is a
//! thin, typed wrapper around it plus the warning-on-lag discipline §4.G
//! asks for.

use tokio::sync::broadcast;
use tracing::warn;

/// Default backpressure threshold before the oldest queued event is dropped.
pub const DEFAULT_CAPACITY: usize = 256;

/// The producing half. Cheap to clone — cloning shares the same ring buffer.
#[derive(Clone)]
pub struct Broadcaster<T> {
    tx: broadcast::Sender<T>,
}

impl<T: Clone> Broadcaster<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to every current subscriber. Returns the number of
    /// subscribers it was delivered to (a subscriber-less broadcast is not
    /// an error — nobody is listening yet).
    pub fn publish(&self, event: T) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    /// Create a new subscriber. Only events published after this call are
    /// visible to it.
    pub fn subscribe(&self) -> Subscriber<T> {
        Subscriber {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// The consuming half of one subscription.
pub struct Subscriber<T> {
    rx: broadcast::Receiver<T>,
}

impl<T: Clone> Subscriber<T> {
    /// Await the next event, transparently absorbing lag: if this
    /// subscriber fell behind and the producer overwrote unread entries,
    /// log a warning and resume from the oldest entry still buffered
    /// rather than surfacing the gap as an error.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscriber fell behind, dropping oldest entries");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_events() {
        let broadcaster: Broadcaster<u32> = Broadcaster::new(DEFAULT_CAPACITY);
        let mut sub = broadcaster.subscribe();
        broadcaster.publish(1);
        broadcaster.publish(2);
        assert_eq!(sub.recv().await, Some(1));
        assert_eq!(sub.recv().await, Some(2));
    }

    #[tokio::test]
    async fn closed_broadcaster_ends_subscription() {
        let broadcaster: Broadcaster<u32> = Broadcaster::new(4);
        let mut sub = broadcaster.subscribe();
        drop(broadcaster);
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn lagging_subscriber_resumes_instead_of_erroring() {
        let broadcaster: Broadcaster<u32> = Broadcaster::new(2);
        let mut sub = broadcaster.subscribe();
        for i in 0..10 {
            broadcaster.publish(i);
        }
        // The lagged receiver resumes from whatever is still buffered
        // instead of returning an error to the caller.
        let next = sub.recv().await;
        assert!(next.is_some());
    }

    #[tokio::test]
    async fn multiple_subscribers_each_get_every_event() {
        let broadcaster: Broadcaster<u32> = Broadcaster::new(DEFAULT_CAPACITY);
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();
        broadcaster.publish(42);
        assert_eq!(a.recv().await, Some(42));
        assert_eq!(b.recv().await, Some(42));
    }
}
