//! # Vantage - Invocation Lifecycle Instrumentation
//!
//! Vantage observes calls into client libraries and publishes a uniform
//! lifecycle of events (`start`, `end`, `async-end`, `error`) for every
//! invocation, no matter which completion convention the library uses:
//! a returned promise, a callback, a trailing callback buried in an
//! argument sequence, or a synchronous failure.
//!
//! ## Guarantees
//!
//! - **Transparency**: the instrumented call's return value, failure
//!   identity, and completion timing are untouched
//! - **Exactly once**: one `start`, one guaranteed `end` per invocation;
//!   at most one `error` and one `async-end`
//! - **Causality**: terminal events run under the context captured at
//!   `start`, so consumers can correlate nested and concurrent calls
//! - **Near-zero cost when off**: without subscribers, dispatch bypasses
//!   instrumentation entirely
//!
//! ## Quick Start
//!
//! ```ignore
//! use vantage::prelude::*;
//!
//! let runtime = Vantage::builder()
//!     .with_lifecycle_subscriber("redis:command", Arc::new(LoggingSubscriber::new()))
//!     .build()?;
//!
//! let tracker = runtime.tracker("redis:command")?;
//! let result = tracker.dispatch(
//!     InvocationDescriptor::new("GET").with_arguments(vec![Value::from("key")]),
//!     || client.dispatch_get("key"),
//! )?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Per-library interceptors (external)        │
//! ├─────────────────────────────────────────────────────────┤
//! │                    vantage (facade)                     │
//! │  ┌───────────────┬──────────────────┬────────────────┐  │
//! │  │ vantage-core  │  vantage-events  │ vantage-model  │  │
//! │  │ (classify,    │  (channels,      │ (values,       │  │
//! │  │  adapt, track)│   subscribers)   │  descriptors)  │  │
//! │  └───────────────┴──────────────────┴────────────────┘  │
//! ├─────────────────────────────────────────────────────────┤
//! │                Event subscribers (external)             │
//! └─────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use vantage_core::{InstrumentationConfig, InvocationTracker};
use vantage_events::{EventBus, EventKind, EventSubscriber, SubscriptionId};

// Re-export from sub-crates
pub use vantage_core;
pub use vantage_events;
pub use vantage_model;

/// Main entry point for Vantage.
pub struct Vantage;

impl Vantage {
    /// Create a new runtime builder.
    pub fn builder() -> VantageBuilder {
        VantageBuilder::new()
    }

    /// Create a runtime with default configuration.
    pub fn with_defaults() -> Result<VantageRuntime, VantageError> {
        VantageBuilder::new().build()
    }
}

/// Builder for configuring the Vantage runtime.
pub struct VantageBuilder {
    config: InstrumentationConfig,
    isolate_subscriber_panics: bool,
    subscriptions: Vec<(String, Arc<dyn EventSubscriber>)>,
}

impl VantageBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: InstrumentationConfig::default(),
            isolate_subscriber_panics: true,
            subscriptions: Vec::new(),
        }
    }

    /// Set the instrumentation configuration.
    pub fn with_config(mut self, config: InstrumentationConfig) -> Self {
        self.config = config;
        self
    }

    /// Isolate subscriber panics during publish.
    ///
    /// This is a bus-wide setting fixed at build time; every channel of
    /// the runtime's bus shares it. Disable only in tests that want
    /// subscriber failures to surface.
    pub fn with_subscriber_panic_isolation(mut self, enabled: bool) -> Self {
        self.isolate_subscriber_panics = enabled;
        self
    }

    /// Subscribe to a single named channel at startup.
    pub fn with_subscriber(
        mut self,
        channel: impl Into<String>,
        subscriber: Arc<dyn EventSubscriber>,
    ) -> Self {
        self.subscriptions.push((channel.into(), subscriber));
        self
    }

    /// Subscribe to all four lifecycle channels of a namespace at startup.
    pub fn with_lifecycle_subscriber(
        mut self,
        namespace: &str,
        subscriber: Arc<dyn EventSubscriber>,
    ) -> Self {
        for kind in EventKind::ALL {
            self.subscriptions
                .push((format!("{namespace}:{kind}"), Arc::clone(&subscriber)));
        }
        self
    }

    /// Build the runtime.
    pub fn build(self) -> Result<VantageRuntime, VantageError> {
        let bus = Arc::new(EventBus::with_panic_isolation(
            self.isolate_subscriber_panics,
        ));

        for (channel, subscriber) in self.subscriptions {
            if channel.is_empty() {
                return Err(VantageError::InvalidChannelName(channel));
            }
            bus.subscribe(&channel, subscriber);
        }

        Ok(VantageRuntime {
            bus,
            config: self.config,
        })
    }
}

impl Default for VantageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured Vantage runtime.
///
/// Owns the single process-wide [`EventBus`]; create it once at process
/// start and keep it for the process lifetime.
pub struct VantageRuntime {
    bus: Arc<EventBus>,
    config: InstrumentationConfig,
}

impl VantageRuntime {
    /// Get the event bus.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Get the instrumentation configuration.
    pub fn config(&self) -> &InstrumentationConfig {
        &self.config
    }

    /// Create an invocation tracker for a command namespace.
    pub fn tracker(&self, namespace: &str) -> Result<InvocationTracker, VantageError> {
        if namespace.is_empty() || namespace.chars().any(char::is_whitespace) {
            return Err(VantageError::InvalidNamespace(namespace.to_string()));
        }
        Ok(InvocationTracker::with_config(
            &self.bus,
            namespace,
            self.config.clone(),
        ))
    }

    /// Subscribe to all four lifecycle channels of a namespace.
    pub fn subscribe_lifecycle(
        &self,
        namespace: &str,
        subscriber: Arc<dyn EventSubscriber>,
    ) -> Vec<SubscriptionId> {
        EventKind::ALL
            .iter()
            .map(|kind| {
                self.bus
                    .subscribe(&format!("{namespace}:{kind}"), Arc::clone(&subscriber))
            })
            .collect()
    }
}

impl std::fmt::Debug for VantageRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VantageRuntime")
            .field("bus", &self.bus)
            .finish()
    }
}

/// Errors from the Vantage runtime.
#[derive(Debug, thiserror::Error)]
pub enum VantageError {
    /// A command namespace was empty or contained whitespace.
    #[error("Invalid command namespace: {0:?}")]
    InvalidNamespace(String),

    /// A channel name was empty.
    #[error("Invalid channel name: {0:?}")]
    InvalidChannelName(String),
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Main types
    pub use crate::{Vantage, VantageBuilder, VantageError, VantageRuntime};

    // Core types
    pub use vantage_core::{
        CommandCall, CompletionHandle, CompletionScope, Context, DefaultExtractor,
        DescriptorExtractor, InstrumentationConfig, InvocationTracker, classify, instrument,
    };

    // Event types
    pub use vantage_events::{
        Channel, CollectingSubscriber, EventBus, EventKind, EventSubscriber, LifecycleChannels,
        LifecycleEvent, LoggingSubscriber,
    };

    // Model types
    pub use vantage_model::{
        Callback, CompletionArgs, ConnectionInfo, FailureValue, InvocationDescriptor,
        InvocationId, Promise, Settlement, Value,
    };

    // Common std types
    pub use std::sync::Arc;
}
