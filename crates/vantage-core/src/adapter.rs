//! Completion adapting.
//!
//! The adapter wraps a classified completion so that exactly one terminal
//! event pair fires when the real operation finishes: `error` first if the
//! completion signals failure, then `async-end`, unconditionally. Wrapping
//! is transparent: whatever the unwrapped operation would have delivered
//! (the promise's settlement value, the arguments passed to a real
//! callback, the untouched elements of a sequence) is delivered bit for bit.
//!
//! Every wrapper is bound to the invocation's context and guarded so that
//! the terminal pair fires at most once even if a misbehaving callee
//! invokes the wrapped callback twice.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;
use vantage_events::{LifecycleChannels, LifecycleEvent};
use vantage_model::{Callback, Settlement, Value};

use crate::classify::CompletionHandle;
use crate::context::Context;

/// Adapt a classified completion, returning the value to hand back to the
/// original caller.
pub fn adapt(channels: &LifecycleChannels, context: &Context, handle: CompletionHandle) -> Value {
    match handle {
        CompletionHandle::None(value) => value,
        CompletionHandle::Callback(real) => {
            Value::Callback(wrap_callback(channels.clone(), context.clone(), real))
        }
        CompletionHandle::Promise(promise) => {
            observe_promise(channels.clone(), context.clone(), &promise);
            Value::Promise(promise)
        }
        CompletionHandle::CollectionWithTrailingCallback { mut head, callback } => {
            let wrapped = wrap_callback(channels.clone(), context.clone(), Some(callback));
            head.push(Value::Callback(wrapped));
            Value::Sequence(head)
        }
    }
}

/// Produce the wrapper callback for callback-shaped completion.
///
/// On invocation the wrapper publishes `error` (if the first argument is a
/// failure) then `async-end`, then forwards the full original argument
/// list to the real callback. Absent a real callback, the wrapper still
/// fires the events and stands in as the callback itself.
pub fn wrap_callback(
    channels: LifecycleChannels,
    context: Context,
    real: Option<Callback>,
) -> Callback {
    // The real callback carries the same bound context as the wrapper.
    let real = real.map(|callback| context.bind(callback));
    let fired = Arc::new(AtomicBool::new(false));

    Callback::new(move |args| {
        if fired.swap(true, Ordering::SeqCst) {
            debug!(
                namespace = channels.namespace(),
                "Completion callback invoked again; forwarding without events"
            );
            if let Some(callback) = &real {
                callback.invoke(args);
            }
            return;
        }

        let _guard = context.enter();
        if let Some(failure) = &args.error {
            channels.error().publish(&LifecycleEvent::Error(failure.clone()));
        }
        channels.async_end().publish(&LifecycleEvent::AsyncEnd);

        if let Some(callback) = &real {
            callback.invoke(args);
        }
    })
}

/// Attach observation continuations to a promise-shaped completion.
///
/// The promise itself is returned to the caller unchanged; settlement
/// timing and value are unaffected.
fn observe_promise(channels: LifecycleChannels, context: Context, promise: &vantage_model::Promise) {
    promise.then(move |settlement| {
        let _guard = context.enter();
        if let Settlement::Rejected(failure) = settlement {
            channels.error().publish(&LifecycleEvent::Error(failure.clone()));
        }
        channels.async_end().publish(&LifecycleEvent::AsyncEnd);
    });
}
