//! Runtime values exchanged with instrumented operations.
//!
//! Client libraries signal completion in incompatible conventions: some
//! return a promise, some accept a callback, some bury a trailing callback
//! inside an argument sequence, and some offer no completion signal at all.
//! [`Value`] is the tagged representation those conventions are expressed
//! in, so that classification is a `match` over explicit variants rather
//! than duck-typed sniffing.

use std::any::Any;
use std::sync::Arc;

use crate::failure::FailureValue;
use crate::promise::Promise;

/// A runtime value returned by, or passed to, an instrumented operation.
#[derive(Clone)]
pub enum Value {
    /// No value at all.
    Unit,
    /// Plain structured data.
    Data(serde_json::Value),
    /// A completion callback.
    Callback(Callback),
    /// A promise that will settle later.
    Promise(Promise),
    /// An ordered sequence of values.
    Sequence(Vec<Value>),
    /// A host value Vantage passes through without interpreting.
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Convenience constructor for [`Value::Data`].
    pub fn data(value: impl Into<serde_json::Value>) -> Self {
        Value::Data(value.into())
    }

    /// Convenience constructor for [`Value::Opaque`].
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    /// Whether this value is a callback.
    pub fn is_callback(&self) -> bool {
        matches!(self, Value::Callback(_))
    }

    /// Borrow the callback, if this value is one.
    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Value::Callback(callback) => Some(callback),
            _ => None,
        }
    }

    /// Borrow the promise, if this value is one.
    pub fn as_promise(&self) -> Option<&Promise> {
        match self {
            Value::Promise(promise) => Some(promise),
            _ => None,
        }
    }

    /// Borrow the sequence elements, if this value is a sequence.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Render the value as JSON, replacing non-data variants with markers.
    ///
    /// Used when a descriptor is serialized for consumers that want a
    /// readable record of the arguments rather than live handles.
    pub fn to_json_lossy(&self) -> serde_json::Value {
        match self {
            Value::Unit => serde_json::Value::Null,
            Value::Data(data) => data.clone(),
            Value::Callback(_) => serde_json::Value::String("<callback>".into()),
            Value::Promise(_) => serde_json::Value::String("<promise>".into()),
            Value::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json_lossy).collect())
            }
            Value::Opaque(_) => serde_json::Value::String("<opaque>".into()),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality for data, identity equality for handles.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Data(a), Value::Data(b)) => a == b,
            (Value::Callback(a), Value::Callback(b)) => a.ptr_eq(b),
            (Value::Promise(a), Value::Promise(b)) => a.ptr_eq(b),
            (Value::Sequence(a), Value::Sequence(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Unit => write!(f, "Unit"),
            Value::Data(data) => f.debug_tuple("Data").field(data).finish(),
            Value::Callback(_) => write!(f, "Callback"),
            Value::Promise(promise) => f.debug_tuple("Promise").field(promise).finish(),
            Value::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Value::Opaque(_) => write!(f, "Opaque"),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Data(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Data(serde_json::Value::String(value.to_string()))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Data(serde_json::Value::from(value))
    }
}

/// The arguments delivered to a completion callback.
///
/// Mirrors the `(err, ...results)` convention: an optional failure first,
/// then the result values. Wrapping a callback must forward this record
/// unchanged, so both fields are plain data the wrapper never edits.
#[derive(Debug, Clone)]
pub struct CompletionArgs {
    /// The failure, if the operation did not succeed.
    pub error: Option<FailureValue>,
    /// The result values.
    pub values: Vec<Value>,
}

impl CompletionArgs {
    /// Arguments for a successful completion.
    pub fn success(values: Vec<Value>) -> Self {
        Self {
            error: None,
            values,
        }
    }

    /// Arguments for a failed completion.
    pub fn failure(error: FailureValue) -> Self {
        Self {
            error: Some(error),
            values: Vec::new(),
        }
    }

    /// Whether these arguments signal a failure.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// A cloneable completion callback.
///
/// All clones share the same underlying function, so a wrapped callback can
/// be installed in several places while [`Callback::ptr_eq`] still
/// identifies it.
#[derive(Clone)]
pub struct Callback {
    inner: Arc<dyn Fn(CompletionArgs) + Send + Sync>,
}

impl Callback {
    /// Create a callback from a function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(CompletionArgs) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Invoke the callback with the given completion arguments.
    pub fn invoke(&self, args: CompletionArgs) {
        (self.inner)(args)
    }

    /// Whether two handles refer to the same underlying function.
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callback")
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_callback_invoke() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let callback = Callback::new(move |args| {
            assert!(!args.is_failure());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        callback.invoke(CompletionArgs::success(vec![Value::from("ok")]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_callback_clone_shares_identity() {
        let callback = Callback::new(|_| {});
        let clone = callback.clone();
        assert!(callback.ptr_eq(&clone));
        assert!(!callback.ptr_eq(&Callback::new(|_| {})));
    }

    #[test]
    fn test_value_equality() {
        assert_eq!(Value::from("a"), Value::from("a"));
        assert_ne!(Value::from("a"), Value::from("b"));
        assert_eq!(Value::Unit, Value::Unit);

        let seq = Value::Sequence(vec![Value::from(1), Value::from(2)]);
        assert_eq!(seq, Value::Sequence(vec![Value::from(1), Value::from(2)]));
    }

    #[test]
    fn test_to_json_lossy() {
        let value = Value::Sequence(vec![
            Value::from("GET"),
            Value::Callback(Callback::new(|_| {})),
        ]);
        assert_eq!(
            value.to_json_lossy(),
            serde_json::json!(["GET", "<callback>"])
        );
    }
}
