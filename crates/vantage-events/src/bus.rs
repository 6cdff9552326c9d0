//! The process-wide event bus.
//!
//! One [`EventBus`] is constructed at process start and lives for the
//! process lifetime. It owns the registry of named channels; channels are
//! created lazily on first use and never torn down. The bus is injected
//! into whatever publishes or subscribes, rather than reached through
//! ambient global state.

use std::sync::Arc;

use dashmap::DashMap;

use crate::channel::{Channel, SubscriptionId};
use crate::event::{EventKind, LifecycleEvent};
use crate::subscriber::EventSubscriber;

/// Registry of named lifecycle channels.
pub struct EventBus {
    channels: DashMap<String, Arc<Channel>>,
    isolate_panics: bool,
}

impl EventBus {
    /// Create a bus that isolates subscriber panics.
    pub fn new() -> Self {
        Self::with_panic_isolation(true)
    }

    /// Create a bus, choosing whether subscriber panics are isolated
    /// during publish.
    pub fn with_panic_isolation(isolate_panics: bool) -> Self {
        Self {
            channels: DashMap::new(),
            isolate_panics,
        }
    }

    /// Get the channel with the given name, creating it if needed.
    pub fn channel(&self, name: &str) -> Arc<Channel> {
        if let Some(channel) = self.channels.get(name) {
            return Arc::clone(channel.value());
        }
        let entry = self
            .channels
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Channel::with_panic_isolation(name, self.isolate_panics)));
        Arc::clone(entry.value())
    }

    /// Whether the named channel currently has subscribers.
    ///
    /// A channel nobody ever touched has none.
    pub fn has_subscribers(&self, name: &str) -> bool {
        self.channels
            .get(name)
            .map(|channel| channel.has_subscribers())
            .unwrap_or(false)
    }

    /// Subscribe to the named channel.
    pub fn subscribe(&self, name: &str, subscriber: Arc<dyn EventSubscriber>) -> SubscriptionId {
        self.channel(name).subscribe(subscriber)
    }

    /// Publish to the named channel, if it exists.
    pub fn publish(&self, name: &str, event: &LifecycleEvent) {
        if let Some(channel) = self.channels.get(name) {
            channel.publish(event);
        }
    }

    /// Number of channels that have been created.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("channel_count", &self.channel_count())
            .finish()
    }
}

/// The four lifecycle channels of one command namespace.
///
/// Channel names are `<namespace>:<kind>`, e.g. `redis:command:start`.
/// The bundle is cheap to clone; clones share the same channels.
#[derive(Clone)]
pub struct LifecycleChannels {
    namespace: String,
    start: Arc<Channel>,
    end: Arc<Channel>,
    async_end: Arc<Channel>,
    error: Arc<Channel>,
}

impl LifecycleChannels {
    /// Resolve the four channels for `namespace` on the given bus.
    pub fn new(bus: &EventBus, namespace: &str) -> Self {
        let channel_for = |kind: EventKind| bus.channel(&format!("{namespace}:{kind}"));
        Self {
            namespace: namespace.to_string(),
            start: channel_for(EventKind::Start),
            end: channel_for(EventKind::End),
            async_end: channel_for(EventKind::AsyncEnd),
            error: channel_for(EventKind::Error),
        }
    }

    /// The command namespace these channels belong to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The `start` channel.
    pub fn start(&self) -> &Channel {
        &self.start
    }

    /// The `end` channel.
    pub fn end(&self) -> &Channel {
        &self.end
    }

    /// The `async-end` channel.
    pub fn async_end(&self) -> &Channel {
        &self.async_end
    }

    /// The `error` channel.
    pub fn error(&self) -> &Channel {
        &self.error
    }

    /// The channel for a given kind.
    pub fn for_kind(&self, kind: EventKind) -> &Channel {
        match kind {
            EventKind::Start => &self.start,
            EventKind::End => &self.end,
            EventKind::AsyncEnd => &self.async_end,
            EventKind::Error => &self.error,
        }
    }
}

impl std::fmt::Debug for LifecycleChannels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleChannels")
            .field("namespace", &self.namespace)
            .finish()
    }
}
