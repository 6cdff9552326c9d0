//! Invocation tracking.
//!
//! The tracker orchestrates the lifecycle around one intercepted call:
//!
//! ```text
//! INIT -> (no subscribers) -> PASSTHROUGH (call the operation directly)
//! INIT -> STARTED (publish start) -> DISPATCHING (call the operation)
//! DISPATCHING -> SYNC_FAILURE: publish error, publish end, return the failure
//! DISPATCHING -> DISPATCHED: publish end, classify + adapt the value, return it
//! DISPATCHED -> (adapter fires later) -> [error?, async-end]
//! ```
//!
//! `end` is published from a drop guard, so it fires exactly once on both
//! the success and the failure path, before control returns to the caller.
//! `end` does not mean the operation finished; only that dispatch returned.
//! Returned values are adapted only after `end` has been published, so a
//! completion that is already settled when dispatch returns still fires its
//! terminal events after `end`.

use tracing::debug;
use vantage_events::{Channel, EventBus, LifecycleChannels, LifecycleEvent};
use vantage_model::{FailureValue, InvocationDescriptor, Value};

use crate::adapter;
use crate::classify::classify;
use crate::config::InstrumentationConfig;
use crate::context::Context;

/// Publishes `end` when dropped, so it fires on every exit path out of
/// dispatch.
struct EndGuard<'a> {
    channel: &'a Channel,
}

impl Drop for EndGuard<'_> {
    fn drop(&mut self) {
        self.channel.publish(&LifecycleEvent::End);
    }
}

/// Handle given to an operation being dispatched, for wrapping completion
/// values it must install *before* dispatch.
///
/// Callback-first client APIs take the completion callback as an argument
/// rather than returning one; their interceptors call [`CompletionScope::adapt`]
/// on that argument so the invocation's terminal events ride on it.
pub struct CompletionScope<'a> {
    tracker: &'a InvocationTracker,
    context: Context,
    enabled: bool,
}

impl CompletionScope<'_> {
    /// Classify and adapt a completion value under this invocation's
    /// context. Identity when instrumentation is bypassed.
    pub fn adapt(&self, value: Value) -> Value {
        if !self.enabled {
            return value;
        }
        adapter::adapt(&self.tracker.channels, &self.context, classify(value))
    }

    /// The context bound to this invocation.
    pub fn context(&self) -> &Context {
        &self.context
    }
}

/// Tracks invocations for one command namespace.
pub struct InvocationTracker {
    channels: LifecycleChannels,
    config: InstrumentationConfig,
}

impl InvocationTracker {
    /// Create a tracker with default configuration.
    pub fn new(bus: &EventBus, namespace: &str) -> Self {
        Self::with_config(bus, namespace, InstrumentationConfig::default())
    }

    /// Create a tracker with the given configuration.
    pub fn with_config(bus: &EventBus, namespace: &str, config: InstrumentationConfig) -> Self {
        Self {
            channels: LifecycleChannels::new(bus, namespace),
            config,
        }
    }

    /// The tracker's lifecycle channels.
    pub fn channels(&self) -> &LifecycleChannels {
        &self.channels
    }

    /// The tracker's configuration.
    pub fn config(&self) -> &InstrumentationConfig {
        &self.config
    }

    /// Dispatch an operation whose *returned value* carries the completion:
    /// the value is classified and adapted before being handed back.
    ///
    /// This is the common path for return-value-style client APIs
    /// (promises, or operations returning their own callback). Adaptation
    /// runs after `end` has been published, so `async-end` and the async
    /// `error` never precede `end`, even for an already-settled promise.
    pub fn dispatch<F>(
        &self,
        descriptor: InvocationDescriptor,
        op: F,
    ) -> Result<Value, FailureValue>
    where
        F: FnOnce() -> Result<Value, FailureValue>,
    {
        let mut completion: Option<Context> = None;
        let outcome = self.dispatch_with(descriptor, |scope| {
            if scope.enabled {
                completion = Some(scope.context.clone());
            }
            op()
        });
        match (outcome, completion) {
            (Ok(value), Some(context)) => {
                Ok(adapter::adapt(&self.channels, &context, classify(value)))
            }
            (outcome, _) => outcome,
        }
    }

    /// Dispatch an operation that installs its own completion wrapping via
    /// the provided [`CompletionScope`]; the returned value is handed back
    /// untouched.
    ///
    /// The lifecycle is identical to [`InvocationTracker::dispatch`]:
    /// `start` before the operation runs, `end` guaranteed immediately
    /// after it returns or fails, `error` published and the failure handed
    /// back unchanged on synchronous failure.
    pub fn dispatch_with<F>(
        &self,
        mut descriptor: InvocationDescriptor,
        op: F,
    ) -> Result<Value, FailureValue>
    where
        F: FnOnce(&CompletionScope<'_>) -> Result<Value, FailureValue>,
    {
        if !self.channels.start().has_subscribers() {
            // Passthrough: no instrumentation work at all.
            let scope = CompletionScope {
                tracker: self,
                context: Context::current(),
                enabled: false,
            };
            return op(&scope);
        }

        if let Some(max) = self.config.max_recorded_arguments {
            descriptor.arguments.truncate(max);
        }

        let invocation = descriptor.invocation;
        let context = Context::current().child_for(invocation);
        let entered = context.enter();

        self.channels
            .start()
            .publish(&LifecycleEvent::Start(descriptor));

        let end_guard = EndGuard {
            channel: self.channels.end(),
        };

        let scope = CompletionScope {
            tracker: self,
            context: context.clone(),
            enabled: true,
        };

        let outcome = match op(&scope) {
            Ok(value) => Ok(value),
            Err(failure) => {
                if self.config.log_sync_failures {
                    // Snapshot the diagnostics at the catch point, before
                    // the failure travels on.
                    debug!(
                        namespace = self.channels.namespace(),
                        invocation = %invocation,
                        error = %failure,
                        "Synchronous dispatch failure"
                    );
                }
                self.channels
                    .error()
                    .publish(&LifecycleEvent::Error(failure.clone()));
                Err(failure)
            }
        };

        // `end` fires here, after `error` on the failure path and after
        // classification on the success path, before control returns.
        drop(end_guard);
        drop(entered);
        outcome
    }
}

impl std::fmt::Debug for InvocationTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvocationTracker")
            .field("namespace", &self.channels.namespace())
            .finish()
    }
}
