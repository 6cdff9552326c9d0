//! Context capture and binding.
//!
//! A [`Context`] is an explicit value describing the logical execution
//! context an invocation started under. The tracker creates a child
//! context carrying the invocation's ID, enters it for the synchronous
//! phase, and binds it to every callback the adapter produces, so when a
//! completion runs later, possibly on an unrelated call stack, subscribers
//! observing the terminal events see the context that was active at
//! `start`, not whatever happens to be active at completion time.
//!
//! Binding is symmetric: the wrapper and the real callback it forwards to
//! both run under the same bound context, so nested instrumentation sees a
//! consistent picture.

use std::cell::RefCell;
use std::sync::Arc;

use tracing::warn;
use vantage_model::{Callback, InvocationId};

struct ContextData {
    invocation: Option<InvocationId>,
    parent: Option<Context>,
}

thread_local! {
    static CURRENT: RefCell<Vec<Context>> = const { RefCell::new(Vec::new()) };
}

/// A captured logical execution context.
///
/// Cheap to clone; clones share identity ([`Context::ptr_eq`]).
#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextData>,
}

impl Context {
    /// The root context: no invocation, no parent.
    pub fn root() -> Self {
        Self {
            inner: Arc::new(ContextData {
                invocation: None,
                parent: None,
            }),
        }
    }

    /// The context active on this thread, or the root context if none has
    /// been entered.
    pub fn current() -> Self {
        CURRENT.with(|stack| stack.borrow().last().cloned()).unwrap_or_else(Self::root)
    }

    /// Derive a child context for an invocation.
    pub fn child_for(&self, invocation: InvocationId) -> Self {
        Self {
            inner: Arc::new(ContextData {
                invocation: Some(invocation),
                parent: Some(self.clone()),
            }),
        }
    }

    /// The invocation this context belongs to, if any.
    pub fn invocation(&self) -> Option<InvocationId> {
        self.inner.invocation
    }

    /// The parent context, if any.
    pub fn parent(&self) -> Option<&Context> {
        self.inner.parent.as_ref()
    }

    /// Make this context current until the returned guard is dropped.
    pub fn enter(&self) -> ContextGuard {
        CURRENT.with(|stack| stack.borrow_mut().push(self.clone()));
        ContextGuard {
            expected: self.clone(),
        }
    }

    /// Bind a callback to this context.
    ///
    /// The returned callback enters this context for the duration of each
    /// invocation of the inner callback.
    pub fn bind(&self, callback: Callback) -> Callback {
        let context = self.clone();
        Callback::new(move |args| {
            let _guard = context.enter();
            callback.invoke(args);
        })
    }

    /// Whether two handles refer to the same context.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("invocation", &self.inner.invocation)
            .field("depth", &{
                let mut depth = 0usize;
                let mut current = self.inner.parent.as_ref();
                while let Some(parent) = current {
                    depth += 1;
                    current = parent.inner.parent.as_ref();
                }
                depth
            })
            .finish()
    }
}

/// Restores the previously-current context on drop.
///
/// Not `Send`: a guard must be dropped on the thread that created it.
pub struct ContextGuard {
    expected: Context,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT.with(|stack| {
            let popped = stack.borrow_mut().pop();
            match popped {
                Some(context) if context.ptr_eq(&self.expected) => {}
                _ => warn!("context guard dropped out of order"),
            }
        });
    }
}

impl std::fmt::Debug for ContextGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextGuard").finish()
    }
}

#[cfg(test)]
mod tests {
    use vantage_model::CompletionArgs;

    use super::*;

    #[test]
    fn test_current_defaults_to_root() {
        let current = Context::current();
        assert!(current.invocation().is_none());
        assert!(current.parent().is_none());
    }

    #[test]
    fn test_enter_and_restore() {
        let invocation = InvocationId::new();
        let context = Context::root().child_for(invocation);

        {
            let _guard = context.enter();
            assert_eq!(Context::current().invocation(), Some(invocation));
        }
        assert_eq!(Context::current().invocation(), None);
    }

    #[test]
    fn test_nested_contexts() {
        let outer = Context::root().child_for(InvocationId::new());
        let inner = outer.child_for(InvocationId::new());

        let _outer_guard = outer.enter();
        {
            let _inner_guard = inner.enter();
            assert!(Context::current().ptr_eq(&inner));
            assert!(Context::current().parent().unwrap().ptr_eq(&outer));
        }
        assert!(Context::current().ptr_eq(&outer));
    }

    #[test]
    fn test_bound_callback_restores_context() {
        let invocation = InvocationId::new();
        let context = Context::root().child_for(invocation);

        let observed = std::sync::Arc::new(parking_lot::Mutex::new(None));
        let slot = std::sync::Arc::clone(&observed);
        let bound = context.bind(Callback::new(move |_| {
            *slot.lock() = Some(Context::current().invocation());
        }));

        // Invoked outside any entered context, yet observes the bound one.
        bound.invoke(CompletionArgs::success(Vec::new()));
        assert_eq!(*observed.lock(), Some(Some(invocation)));
        assert_eq!(Context::current().invocation(), None);
    }
}
