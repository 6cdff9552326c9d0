//! Completion classification.
//!
//! Client libraries change completion conventions version to version; the
//! classifier isolates that variability so the adapter only ever sees one
//! of four shapes. Classification is an ordered set of predicates over the
//! tagged [`Value`], first match wins:
//!
//! 1. Absent value or a bare function: callback shape.
//! 2. Thenable: promise shape. The promise predicate precedes the sequence
//!    predicate because promise semantics are the more specific.
//! 3. Non-empty sequence whose last element is callable: collection with a
//!    trailing callback.
//! 4. Anything else: no completion to observe; passed through untouched.

use vantage_model::{Callback, Value};

/// The classified completion shape of a dispatched operation's value.
#[derive(Debug, Clone)]
pub enum CompletionHandle {
    /// No observable completion; the value passes through unmodified.
    None(Value),
    /// Callback-shaped completion. `None` means no completion observation
    /// was requested, and the wrapper itself becomes the callback.
    Callback(Option<Callback>),
    /// Promise-shaped completion.
    Promise(vantage_model::Promise),
    /// A sequence whose trailing element is the completion callback.
    /// `head` holds every element before the callback, unchanged.
    CollectionWithTrailingCallback {
        /// All elements before the trailing callback, in order.
        head: Vec<Value>,
        /// The trailing callback.
        callback: Callback,
    },
}

impl CompletionHandle {
    /// Whether any terminal event will ever fire for this handle.
    pub fn is_observable(&self) -> bool {
        !matches!(self, CompletionHandle::None(_))
    }
}

/// Classify the value returned by a dispatched operation.
pub fn classify(value: Value) -> CompletionHandle {
    match value {
        Value::Unit => CompletionHandle::Callback(None),
        Value::Callback(callback) => CompletionHandle::Callback(Some(callback)),
        Value::Promise(promise) => CompletionHandle::Promise(promise),
        Value::Sequence(mut items) => {
            if matches!(items.last(), Some(Value::Callback(_))) {
                let Some(Value::Callback(callback)) = items.pop() else {
                    unreachable!("last element checked above");
                };
                CompletionHandle::CollectionWithTrailingCallback {
                    head: items,
                    callback,
                }
            } else {
                CompletionHandle::None(Value::Sequence(items))
            }
        }
        other => CompletionHandle::None(other),
    }
}

#[cfg(test)]
mod tests {
    use vantage_model::Promise;

    use super::*;

    #[test]
    fn test_unit_is_callback_shape_without_callback() {
        match classify(Value::Unit) {
            CompletionHandle::Callback(None) => {}
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_function_is_callback_shape() {
        let callback = Callback::new(|_| {});
        match classify(Value::Callback(callback.clone())) {
            CompletionHandle::Callback(Some(classified)) => assert!(classified.ptr_eq(&callback)),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_promise_shape() {
        let promise = Promise::pending();
        let handle = classify(Value::Promise(promise.clone()));
        assert!(handle.is_observable());
        match handle {
            CompletionHandle::Promise(classified) => assert!(classified.ptr_eq(&promise)),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_sequence_with_trailing_callback() {
        let callback = Callback::new(|_| {});
        let value = Value::Sequence(vec![
            Value::from("a"),
            Value::from("b"),
            Value::Callback(callback.clone()),
        ]);

        match classify(value) {
            CompletionHandle::CollectionWithTrailingCallback { head, callback: cb } => {
                assert_eq!(head, vec![Value::from("a"), Value::from("b")]);
                assert!(cb.ptr_eq(&callback));
            }
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_sequence_without_trailing_callback_is_none() {
        let value = Value::Sequence(vec![Value::from("a"), Value::from("b")]);
        match classify(value.clone()) {
            CompletionHandle::None(passed) => assert_eq!(passed, value),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_empty_sequence_is_none() {
        match classify(Value::Sequence(Vec::new())) {
            CompletionHandle::None(Value::Sequence(items)) => assert!(items.is_empty()),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_plain_data_is_none() {
        let handle = classify(Value::from(42));
        assert!(!handle.is_observable());
        match handle {
            CompletionHandle::None(value) => assert_eq!(value, Value::from(42)),
            other => panic!("unexpected shape: {other:?}"),
        }
    }
}
