//! Promise-shaped completion.
//!
//! A [`Promise`] is the thenable half of the completion model: a deferred
//! value that settles exactly once, either fulfilled with a [`Value`] or
//! rejected with a [`FailureValue`]. Observers attached with
//! [`Promise::then`] run in attachment order when the promise settles;
//! attaching to an already-settled promise runs the observer immediately.
//!
//! Observation never replaces the promise. Instrumentation attaches
//! continuations and hands the same promise back, so the caller's view of
//! settlement timing and settlement value is untouched.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::failure::FailureValue;
use crate::value::Value;

/// The outcome of a settled promise.
#[derive(Debug, Clone)]
pub enum Settlement {
    /// The promise was fulfilled with a value.
    Fulfilled(Value),
    /// The promise was rejected with a failure.
    Rejected(FailureValue),
}

impl Settlement {
    /// Whether this settlement is a rejection.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Settlement::Rejected(_))
    }

    /// The failure, if this settlement is a rejection.
    pub fn failure(&self) -> Option<&FailureValue> {
        match self {
            Settlement::Rejected(failure) => Some(failure),
            Settlement::Fulfilled(_) => None,
        }
    }
}

type Observer = Box<dyn FnOnce(&Settlement) + Send>;

struct PromiseShared {
    settlement: Option<Settlement>,
    observers: Vec<Observer>,
}

/// A deferred value that settles exactly once.
#[derive(Clone)]
pub struct Promise {
    inner: Arc<Mutex<PromiseShared>>,
}

impl Promise {
    /// Create a pending promise.
    pub fn pending() -> Self {
        Self {
            inner: Arc::new(Mutex::new(PromiseShared {
                settlement: None,
                observers: Vec::new(),
            })),
        }
    }

    /// Create a promise already fulfilled with `value`.
    pub fn fulfilled(value: Value) -> Self {
        let promise = Self::pending();
        promise.fulfill(value);
        promise
    }

    /// Create a promise already rejected with `failure`.
    pub fn rejected(failure: FailureValue) -> Self {
        let promise = Self::pending();
        promise.reject(failure);
        promise
    }

    /// Fulfill the promise.
    ///
    /// Returns `false` if the promise was already settled; the second
    /// settlement is ignored.
    pub fn fulfill(&self, value: Value) -> bool {
        self.settle(Settlement::Fulfilled(value))
    }

    /// Reject the promise.
    ///
    /// Returns `false` if the promise was already settled; the second
    /// settlement is ignored.
    pub fn reject(&self, failure: FailureValue) -> bool {
        self.settle(Settlement::Rejected(failure))
    }

    fn settle(&self, settlement: Settlement) -> bool {
        let observers = {
            let mut shared = self.inner.lock();
            if shared.settlement.is_some() {
                debug!("promise already settled; ignoring second settlement");
                return false;
            }
            shared.settlement = Some(settlement.clone());
            std::mem::take(&mut shared.observers)
        };

        // Observers run outside the lock so they may attach further
        // observers or inspect the promise without deadlocking.
        for observer in observers {
            observer(&settlement);
        }
        true
    }

    /// Attach an observer that runs once, when the promise settles.
    ///
    /// If the promise is already settled the observer runs immediately, in
    /// the caller's turn.
    pub fn then<F>(&self, observer: F)
    where
        F: FnOnce(&Settlement) + Send + 'static,
    {
        let settlement = {
            let mut shared = self.inner.lock();
            match &shared.settlement {
                Some(settlement) => settlement.clone(),
                None => {
                    shared.observers.push(Box::new(observer));
                    return;
                }
            }
        };
        observer(&settlement);
    }

    /// The settlement, if the promise has settled.
    pub fn settlement(&self) -> Option<Settlement> {
        self.inner.lock().settlement.clone()
    }

    /// Whether the promise has settled.
    pub fn is_settled(&self) -> bool {
        self.inner.lock().settlement.is_some()
    }

    /// Whether two handles refer to the same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Promise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.inner.lock();
        f.debug_struct("Promise")
            .field("settled", &shared.settlement.is_some())
            .field("observers", &shared.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_fulfill_runs_observers_in_order() {
        let promise = Promise::pending();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let order = Arc::clone(&order);
            promise.then(move |settlement| {
                assert!(!settlement.is_rejected());
                order.lock().push(tag);
            });
        }

        assert!(promise.fulfill(Value::from("done")));
        assert_eq!(*order.lock(), vec!["first", "second"]);
    }

    #[test]
    fn test_then_after_settlement_runs_immediately() {
        let promise = Promise::fulfilled(Value::from(7));
        let ran = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ran);

        promise.then(move |settlement| {
            match settlement {
                Settlement::Fulfilled(value) => assert_eq!(*value, Value::from(7)),
                Settlement::Rejected(_) => panic!("unexpected rejection"),
            }
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_second_settlement_ignored() {
        let promise = Promise::pending();
        assert!(promise.reject(FailureValue::msg("boom")));
        assert!(!promise.fulfill(Value::Unit));

        match promise.settlement() {
            Some(Settlement::Rejected(failure)) => assert_eq!(failure.to_string(), "boom"),
            other => panic!("unexpected settlement: {other:?}"),
        }
    }

    #[test]
    fn test_observer_may_reattach() {
        let promise = Promise::pending();
        let count = Arc::new(AtomicUsize::new(0));

        let inner_promise = promise.clone();
        let counter = Arc::clone(&count);
        promise.then(move |_| {
            let counter = Arc::clone(&counter);
            // Attaching from inside an observer must not deadlock.
            inner_promise.then(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        promise.fulfill(Value::Unit);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
