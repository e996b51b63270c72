//! In-process fan-out of state events to dashboard sessions.
//!
//! # Architecture
//!
//! ```text
//!                      ┌── mailbox (cap N) ──► session a
//! bus handler ──► hub ─┼── mailbox (cap N) ──► session b
//!                      └── mailbox (cap N) ──► session c
//! ```
//!
//! Each subscriber owns a bounded `mpsc` mailbox. `publish` only ever uses
//! `try_send`, so a slow or vanished session never holds up the bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::config::OverflowPolicy;
use crate::domain::device::StateEvent;
use crate::domain::foundation::SubscriberId;
use crate::ports::{BroadcastReport, StateBroadcaster};

/// Registry of live subscribers and their mailboxes.
///
/// The registry lock is held for the whole fan-out so concurrent publishes
/// reach every subscriber in the same order. Only non-blocking sends happen
/// under it.
pub struct BroadcastHub {
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<StateEvent>>>,
    mailbox_capacity: usize,
    overflow: OverflowPolicy,
    dropped_total: AtomicU64,
}

impl BroadcastHub {
    pub fn new(mailbox_capacity: usize, overflow: OverflowPolicy) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            mailbox_capacity: mailbox_capacity.max(1),
            overflow,
            dropped_total: AtomicU64::new(0),
        }
    }

    /// Hub with 32-event mailboxes that drops the newest event on overflow.
    pub fn with_default_capacity() -> Self {
        Self::new(32, OverflowPolicy::DropNewest)
    }

    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox_capacity
    }

    /// Registers a new subscriber.
    ///
    /// Dropping the returned [`Subscription`] unregisters it.
    pub fn register(self: &Arc<Self>) -> Subscription {
        let (tx, rx) = mpsc::channel(self.mailbox_capacity);
        let id = SubscriberId::new();
        self.registry().insert(id, tx);

        tracing::debug!(subscriber_id = %id, "Subscriber registered");

        Subscription {
            id,
            mailbox: rx,
            hub: Arc::downgrade(self),
        }
    }

    /// Removes a subscriber. Unknown IDs are ignored.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        let removed = self.registry().remove(&id).is_some();
        if removed {
            tracing::debug!(subscriber_id = %id, "Subscriber unregistered");
        }
        removed
    }

    /// Offers `event` to every registered subscriber without waiting.
    pub fn publish(&self, event: &StateEvent) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut subscribers = self.registry();

        subscribers.retain(|id, mailbox| match mailbox.try_send(event.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                report.dropped += 1;
                tracing::warn!(
                    subscriber_id = %id,
                    device_id = %event.device_id(),
                    action_name = event.action_name(),
                    policy = ?self.overflow,
                    "Subscriber mailbox full"
                );
                if self.overflow == OverflowPolicy::Disconnect {
                    report.removed += 1;
                    false
                } else {
                    true
                }
            }
            Err(TrySendError::Closed(_)) => {
                report.removed += 1;
                tracing::debug!(subscriber_id = %id, "Removing closed subscriber");
                false
            }
        });
        drop(subscribers);

        if report.dropped > 0 {
            self.dropped_total
                .fetch_add(report.dropped as u64, Ordering::Relaxed);
        }
        report
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry().len()
    }

    /// Events dropped on full mailboxes since startup.
    pub fn dropped_total(&self) -> u64 {
        self.dropped_total.load(Ordering::Relaxed)
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<SubscriberId, mpsc::Sender<StateEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateBroadcaster for BroadcastHub {
    fn broadcast(&self, event: &StateEvent) -> BroadcastReport {
        self.publish(event)
    }
}

impl std::fmt::Debug for BroadcastHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastHub")
            .field("subscribers", &self.subscriber_count())
            .field("mailbox_capacity", &self.mailbox_capacity)
            .field("overflow", &self.overflow)
            .finish()
    }
}

/// A registered subscriber's end of the hub.
///
/// Unregisters itself on drop, so every exit path of the owning task
/// releases its registry slot.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriberId,
    mailbox: mpsc::Receiver<StateEvent>,
    hub: Weak<BroadcastHub>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Next event in FIFO order. `None` once the hub has let go of this
    /// subscriber and the mailbox is drained.
    pub async fn recv(&mut self) -> Option<StateEvent> {
        self.mailbox.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unregister(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::DeviceId;

    fn event(state: &str) -> StateEvent {
        StateEvent::new(DeviceId::new(7), "temp", state)
    }

    fn hub(capacity: usize, overflow: OverflowPolicy) -> Arc<BroadcastHub> {
        Arc::new(BroadcastHub::new(capacity, overflow))
    }

    #[tokio::test]
    async fn every_subscriber_receives_one_copy() {
        let hub = hub(4, OverflowPolicy::DropNewest);
        let mut a = hub.register();
        let mut b = hub.register();
        let mut c = hub.register();

        let report = hub.publish(&event("21.5"));

        assert_eq!(report.delivered, 3);
        for sub in [&mut a, &mut b, &mut c] {
            assert_eq!(sub.recv().await, Some(event("21.5")));
            assert!(sub.mailbox.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let hub = hub(8, OverflowPolicy::DropNewest);
        let mut sub = hub.register();

        for i in 0..5 {
            hub.publish(&event(&i.to_string()));
        }

        for i in 0..5 {
            assert_eq!(sub.recv().await.unwrap().state(), i.to_string());
        }
    }

    #[tokio::test]
    async fn full_mailbox_drops_newest_without_blocking() {
        let hub = hub(2, OverflowPolicy::DropNewest);
        let mut slow = hub.register();
        let mut fast = hub.register();

        hub.publish(&event("1"));
        hub.publish(&event("2"));
        assert_eq!(fast.recv().await.unwrap().state(), "1");
        assert_eq!(fast.recv().await.unwrap().state(), "2");

        let report = hub.publish(&event("3"));

        assert_eq!(report.delivered, 1);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.removed, 0);
        assert_eq!(hub.subscriber_count(), 2);
        assert_eq!(hub.dropped_total(), 1);
        assert_eq!(fast.recv().await.unwrap().state(), "3");
        assert_eq!(slow.recv().await.unwrap().state(), "1");
        assert_eq!(slow.recv().await.unwrap().state(), "2");
        assert!(slow.mailbox.try_recv().is_err());
    }

    #[tokio::test]
    async fn disconnect_policy_removes_overflowing_subscriber() {
        let hub = hub(1, OverflowPolicy::Disconnect);
        let mut slow = hub.register();

        hub.publish(&event("1"));
        let report = hub.publish(&event("2"));

        assert_eq!(report.removed, 1);
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(slow.recv().await.unwrap().state(), "1");
        assert_eq!(slow.recv().await, None);
    }

    #[tokio::test]
    async fn unregistered_subscriber_gets_nothing() {
        let hub = hub(4, OverflowPolicy::DropNewest);
        let mut sub = hub.register();

        assert!(hub.unregister(sub.id()));
        let report = hub.publish(&event("1"));

        assert_eq!(report, BroadcastReport::default());
        assert_eq!(sub.recv().await, None);
        assert!(!hub.unregister(sub.id()));
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let hub = hub(4, OverflowPolicy::DropNewest);
        let sub = hub.register();
        assert_eq!(hub.subscriber_count(), 1);

        drop(sub);

        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn closed_mailbox_is_removed_lazily() {
        let hub = hub(4, OverflowPolicy::DropNewest);
        let (tx, rx) = mpsc::channel(4);
        let id = SubscriberId::new();
        hub.registry().insert(id, tx);
        drop(rx);

        let report = hub.publish(&event("1"));

        assert_eq!(report.removed, 1);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[test]
    fn publish_with_no_subscribers_is_a_no_op() {
        let hub = hub(4, OverflowPolicy::DropNewest);
        assert_eq!(hub.publish(&event("1")), BroadcastReport::default());
    }

    #[test]
    fn subscription_outliving_hub_drops_cleanly() {
        let hub = hub(4, OverflowPolicy::DropNewest);
        let sub = hub.register();
        drop(hub);
        drop(sub);
    }
}
