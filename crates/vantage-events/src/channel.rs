//! Named publish/subscribe channels.
//!
//! A [`Channel`] holds the subscriber set for one event kind of one command
//! namespace. Publishing is synchronous and in subscription order, in the
//! publisher's own turn. [`Channel::has_subscribers`] is a relaxed atomic
//! read so that instrumentation can bypass itself at near-zero cost when
//! nobody is listening.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use parking_lot::RwLock;
use tracing::warn;

use crate::event::LifecycleEvent;
use crate::subscriber::EventSubscriber;

/// Handle for removing a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A named publish/subscribe channel for one lifecycle event kind.
pub struct Channel {
    name: String,
    subscribers: RwLock<Vec<(SubscriptionId, Arc<dyn EventSubscriber>)>>,
    subscriber_count: AtomicUsize,
    next_id: AtomicU64,
    isolate_panics: bool,
}

impl Channel {
    /// Create a channel with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_panic_isolation(name, true)
    }

    /// Create a channel, choosing whether subscriber panics are isolated.
    pub fn with_panic_isolation(name: impl Into<String>, isolate_panics: bool) -> Self {
        Self {
            name: name.into(),
            subscribers: RwLock::new(Vec::new()),
            subscriber_count: AtomicUsize::new(0),
            next_id: AtomicU64::new(0),
            isolate_panics,
        }
    }

    /// The channel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether publishing would reach any subscriber.
    ///
    /// This is the cheap check on the instrumentation fast path: a single
    /// relaxed load, no locking.
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count.load(Ordering::Relaxed) != 0
    }

    /// Number of current subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::Relaxed)
    }

    /// Add a subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut subscribers = self.subscribers.write();
        subscribers.push((id, subscriber));
        self.subscriber_count.store(subscribers.len(), Ordering::Relaxed);
        id
    }

    /// Remove a subscription. Returns whether it was present.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscriber_count.store(subscribers.len(), Ordering::Relaxed);
        subscribers.len() != before
    }

    /// Publish an event to all current subscribers, synchronously, in
    /// subscription order.
    ///
    /// A panicking subscriber is its own responsibility: the panic is
    /// caught and logged, and never reaches the publisher or the remaining
    /// subscribers. The payload is not retained after publish.
    pub fn publish(&self, event: &LifecycleEvent) {
        if !self.has_subscribers() {
            return;
        }

        // Snapshot the set so a subscriber may (un)subscribe mid-publish
        // without deadlocking; such changes take effect next publish.
        let subscribers: Vec<_> = self.subscribers.read().clone();

        for (id, subscriber) in subscribers {
            if self.isolate_panics {
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| subscriber.on_event(&self.name, event)));
                if outcome.is_err() {
                    warn!(
                        channel = self.name,
                        subscription = ?id,
                        kind = %event.kind(),
                        "Subscriber panicked during publish; ignoring"
                    );
                }
            } else {
                subscriber.on_event(&self.name, event);
            }
        }
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("name", &self.name)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use crate::subscriber::CollectingSubscriber;

    use super::*;

    #[test]
    fn test_has_subscribers() {
        let channel = Channel::new("ns:start");
        assert!(!channel.has_subscribers());

        let id = channel.subscribe(Arc::new(CollectingSubscriber::new(10)));
        assert!(channel.has_subscribers());
        assert_eq!(channel.subscriber_count(), 1);

        assert!(channel.unsubscribe(id));
        assert!(!channel.has_subscribers());
        assert!(!channel.unsubscribe(id));
    }

    #[test]
    fn test_publish_in_subscription_order() {
        let channel = Channel::new("ns:end");
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let order = Arc::clone(&order);
            channel.subscribe(Arc::new(move |_: &str, _: &LifecycleEvent| {
                order.lock().push(tag);
            }));
        }

        channel.publish(&LifecycleEvent::End);
        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let channel = Channel::new("ns:end");
        channel.publish(&LifecycleEvent::End);
    }

    #[test]
    fn test_subscriber_panic_is_isolated() {
        let channel = Channel::new("ns:end");
        let collector = Arc::new(CollectingSubscriber::new(10));

        channel.subscribe(Arc::new(|_: &str, _: &LifecycleEvent| {
            panic!("bad subscriber");
        }));
        channel.subscribe(Arc::clone(&collector) as Arc<dyn EventSubscriber>);

        // Publisher survives, later subscribers still run.
        channel.publish(&LifecycleEvent::End);
        assert_eq!(collector.len(), 1);
    }

    #[test]
    #[should_panic(expected = "bad subscriber")]
    fn test_panic_isolation_can_be_disabled() {
        let channel = Channel::with_panic_isolation("ns:end", false);
        channel.subscribe(Arc::new(|_: &str, _: &LifecycleEvent| {
            panic!("bad subscriber");
        }));
        channel.publish(&LifecycleEvent::End);
    }
}
