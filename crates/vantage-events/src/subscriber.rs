//! Event subscribers.

use parking_lot::RwLock;

use crate::event::{EventKind, LifecycleEvent};

/// Subscriber for lifecycle events.
pub trait EventSubscriber: Send + Sync {
    /// Called when an event is published on a channel this subscriber is
    /// attached to. `channel` is the full channel name.
    fn on_event(&self, channel: &str, event: &LifecycleEvent);
}

impl<F> EventSubscriber for F
where
    F: Fn(&str, &LifecycleEvent) + Send + Sync,
{
    fn on_event(&self, channel: &str, event: &LifecycleEvent) {
        self(channel, event)
    }
}

/// A subscriber that logs events via `tracing`.
pub struct LoggingSubscriber {
    /// Minimum log level for events.
    pub log_level: tracing::Level,
}

impl LoggingSubscriber {
    /// Create a new logging subscriber.
    pub fn new() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
        }
    }

    /// Set the log level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.log_level = level;
        self
    }
}

impl Default for LoggingSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for LoggingSubscriber {
    fn on_event(&self, channel: &str, event: &LifecycleEvent) {
        match event {
            LifecycleEvent::Start(descriptor) => {
                tracing::debug!(
                    channel,
                    invocation = %descriptor.invocation,
                    command = descriptor.command,
                    arguments = descriptor.arguments.len(),
                    database = descriptor.database,
                    "Invocation started"
                );
            }
            LifecycleEvent::End => {
                tracing::trace!(channel, "Dispatch finished");
            }
            LifecycleEvent::AsyncEnd => {
                tracing::debug!(channel, "Invocation completed");
            }
            LifecycleEvent::Error(failure) => {
                tracing::warn!(channel, error = %failure, "Invocation failed");
            }
        }
    }
}

/// A subscriber that collects events for later inspection.
pub struct CollectingSubscriber {
    events: RwLock<Vec<(String, LifecycleEvent)>>,
    max_events: usize,
}

impl CollectingSubscriber {
    /// Create a new collecting subscriber.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events,
        }
    }

    /// Get collected events.
    pub fn events(&self) -> Vec<(String, LifecycleEvent)> {
        self.events.read().clone()
    }

    /// Get the kinds of collected events, in publication order.
    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.read().iter().map(|(_, e)| e.kind()).collect()
    }

    /// Count collected events of one kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.events
            .read()
            .iter()
            .filter(|(_, e)| e.kind() == kind)
            .count()
    }

    /// Clear collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Get event count.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSubscriber for CollectingSubscriber {
    fn on_event(&self, channel: &str, event: &LifecycleEvent) {
        let mut events = self.events.write();
        if events.len() < self.max_events {
            events.push((channel.to_string(), event.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use vantage_model::InvocationDescriptor;

    use super::*;

    #[test]
    fn test_collecting_subscriber() {
        let subscriber = CollectingSubscriber::new(100);

        subscriber.on_event(
            "redis:command:start",
            &LifecycleEvent::Start(InvocationDescriptor::new("GET")),
        );
        subscriber.on_event("redis:command:end", &LifecycleEvent::End);

        assert_eq!(subscriber.len(), 2);
        assert_eq!(subscriber.kinds(), vec![EventKind::Start, EventKind::End]);
        assert_eq!(subscriber.count(EventKind::Start), 1);

        let events = subscriber.events();
        assert_eq!(events[0].0, "redis:command:start");
    }

    #[test]
    fn test_collecting_subscriber_max_events() {
        let subscriber = CollectingSubscriber::new(2);

        for _ in 0..5 {
            subscriber.on_event("ns:end", &LifecycleEvent::End);
        }

        assert_eq!(subscriber.len(), 2); // Should be capped at max
    }

    #[test]
    fn test_closure_subscriber() {
        let subscriber = |channel: &str, event: &LifecycleEvent| {
            assert_eq!(channel, "ns:end");
            assert_eq!(event.kind(), EventKind::End);
        };
        subscriber.on_event("ns:end", &LifecycleEvent::End);
    }
}
