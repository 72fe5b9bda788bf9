//! Subscriber registry.
//!
//! Every open push stream holds a [`Subscription`]. A refresh is delivered
//! to each subscriber at most once, after which the subscriber leaves the
//! hub; its stream is expected to end.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;

/// Message posted to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Push {
    Refresh,
}

struct Subscriber {
    id: u64,
    tx: Sender<Push>,
}

/// Registry of live push streams.
#[derive(Default)]
pub struct Hub {
    subscribers: Mutex<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl Hub {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a new subscriber. It leaves the hub when dropped.
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = channel::bounded(1);
        self.subscribers.lock().push(Subscriber { id, tx });
        crate::debug!("hub"; "subscriber #{} joined", id);
        Subscription {
            id,
            rx,
            hub: Arc::clone(self),
        }
    }

    /// Tell every subscriber to refresh. Returns how many were told.
    ///
    /// The count is of registered streams. A client that has gone away
    /// stays registered until its stream's next write fails, which is at
    /// most two keepalive intervals later.
    pub fn refresh_all(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        let mut notified = 0;
        for sub in subscribers.drain(..) {
            match sub.tx.try_send(Push::Refresh) {
                Ok(()) | Err(TrySendError::Full(_)) => notified += 1,
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
        notified
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Drop every subscriber; their streams see the hub as gone.
    pub fn close_all(&self) {
        self.subscribers.lock().clear();
    }

    fn unsubscribe(&self, id: u64) {
        self.subscribers.lock().retain(|sub| sub.id != id);
    }
}

/// Receiving end of one subscriber.
pub struct Subscription {
    id: u64,
    rx: Receiver<Push>,
    hub: Arc<Hub>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait up to `timeout` for the next push.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Push, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
        crate::debug!("hub"; "subscriber #{} left", self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_millis(10);

    #[test]
    fn test_refresh_reaches_every_subscriber_once() {
        let hub = Hub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();

        assert_eq!(hub.refresh_all(), 2);
        assert_eq!(a.recv_timeout(SHORT), Ok(Push::Refresh));
        assert_eq!(b.recv_timeout(SHORT), Ok(Push::Refresh));

        // refreshed subscribers have left
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.refresh_all(), 0);
        assert_eq!(a.recv_timeout(SHORT), Err(RecvTimeoutError::Disconnected));
    }

    #[test]
    fn test_dropped_subscription_leaves() {
        let hub = Hub::new();
        let a = hub.subscribe();
        let _b = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        drop(a);
        assert_eq!(hub.subscriber_count(), 1);
        assert_eq!(hub.refresh_all(), 1);
    }

    #[test]
    fn test_quiet_subscriber_times_out() {
        let hub = Hub::new();
        let a = hub.subscribe();

        assert_eq!(a.recv_timeout(SHORT), Err(RecvTimeoutError::Timeout));
    }

    #[test]
    fn test_close_all_disconnects() {
        let hub = Hub::new();
        let a = hub.subscribe();

        hub.close_all();
        assert_eq!(a.recv_timeout(SHORT), Err(RecvTimeoutError::Disconnected));
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn test_subscriber_ids_are_unique() {
        let hub = Hub::new();
        let a = hub.subscribe();
        let b = hub.subscribe();
        assert_ne!(a.id(), b.id());
    }
}
