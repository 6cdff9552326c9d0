//! Opaque failure values.
//!
//! An instrumented operation can fail either synchronously (the dispatch call
//! itself returns an error) or asynchronously (the eventual callback or
//! promise signals failure). In both cases the failure is treated as an
//! opaque value: Vantage never inspects, wraps, or replaces it. The same
//! value that was produced by the operation is published to subscribers and
//! delivered back to the caller, and identity is preserved so that a
//! subscriber can recognize the exact failure the caller saw.

use std::sync::Arc;

/// An opaque failure produced by an instrumented operation.
///
/// `FailureValue` is a cheaply cloneable handle; all clones share the same
/// underlying error, so [`FailureValue::ptr_eq`] can be used to check that
/// two observations refer to the same failure. The underlying error is an
/// [`anyhow::Error`], which captures a backtrace at construction time when
/// backtraces are enabled.
#[derive(Clone)]
pub struct FailureValue {
    inner: Arc<anyhow::Error>,
}

impl FailureValue {
    /// Wrap a concrete error type.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(anyhow::Error::new(error)),
        }
    }

    /// Create a failure from a plain message.
    pub fn msg<M>(message: M) -> Self
    where
        M: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(anyhow::Error::msg(message)),
        }
    }

    /// Whether two handles refer to the same underlying failure.
    pub fn ptr_eq(&self, other: &FailureValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The backtrace captured when the failure was constructed.
    ///
    /// This is the failure's diagnostic trace: it points at the original
    /// throwing site, not at whichever frame later observed the failure.
    pub fn backtrace(&self) -> &std::backtrace::Backtrace {
        self.inner.backtrace()
    }

    /// Attempt to downcast to a concrete error type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.inner.downcast_ref::<E>()
    }

    /// Access the underlying error.
    pub fn as_error(&self) -> &anyhow::Error {
        &self.inner
    }
}

impl From<anyhow::Error> for FailureValue {
    fn from(error: anyhow::Error) -> Self {
        Self {
            inner: Arc::new(error),
        }
    }
}

impl std::fmt::Display for FailureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::fmt::Debug for FailureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Boom;

    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "boom")
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn test_clone_preserves_identity() {
        let failure = FailureValue::msg("boom");
        let clone = failure.clone();
        assert!(failure.ptr_eq(&clone));
    }

    #[test]
    fn test_distinct_failures_differ() {
        let a = FailureValue::msg("boom");
        let b = FailureValue::msg("boom");
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn test_downcast() {
        let failure = FailureValue::new(Boom);
        assert!(failure.downcast_ref::<Boom>().is_some());
        assert_eq!(failure.to_string(), "boom");
    }
}
