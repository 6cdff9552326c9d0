//! Vantage Model
//!
//! Shared data model for the Vantage instrumentation core:
//!
//! - [`Value`]: tagged runtime values exchanged with instrumented operations
//! - [`Callback`] / [`CompletionArgs`]: callback-shaped completion
//! - [`Promise`] / [`Settlement`]: promise-shaped completion
//! - [`FailureValue`]: opaque, identity-preserving failures
//! - [`InvocationDescriptor`]: the immutable per-call record
//!
//! These types carry no instrumentation behavior of their own; the event
//! bus and the invocation tracker are built on top of them.

pub mod descriptor;
pub mod failure;
pub mod promise;
pub mod value;

pub use descriptor::{ConnectionInfo, InvocationDescriptor, InvocationId};
pub use failure::FailureValue;
pub use promise::{Promise, Settlement};
pub use value::{Callback, CompletionArgs, Value};
