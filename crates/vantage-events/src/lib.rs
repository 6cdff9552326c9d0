//! Vantage Events
//!
//! Named publish/subscribe channels for invocation lifecycle events:
//!
//! - [`EventBus`]: process-wide registry of named channels
//! - [`Channel`]: one subscriber set, synchronous ordered publish
//! - [`LifecycleChannels`]: the `start`/`end`/`async-end`/`error` bundle
//!   for one command namespace
//! - [`EventSubscriber`]: the consumer trait, with built-in logging and
//!   collecting implementations
//!
//! Publishing happens in the publisher's own turn; channels introduce no
//! queues and retain no payloads. `has_subscribers` is a relaxed atomic
//! read, which is what makes full instrumentation bypass cheap when
//! nothing is listening.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vantage_events::{CollectingSubscriber, EventBus, LifecycleChannels, LifecycleEvent};
//!
//! let bus = EventBus::new();
//! let collector = Arc::new(CollectingSubscriber::new(100));
//! bus.subscribe("redis:command:start", collector.clone());
//!
//! let channels = LifecycleChannels::new(&bus, "redis:command");
//! assert!(channels.start().has_subscribers());
//! ```

pub mod bus;
pub mod channel;
pub mod event;
pub mod subscriber;

pub use bus::{EventBus, LifecycleChannels};
pub use channel::{Channel, SubscriptionId};
pub use event::{EventKind, LifecycleEvent};
pub use subscriber::{CollectingSubscriber, EventSubscriber, LoggingSubscriber};
