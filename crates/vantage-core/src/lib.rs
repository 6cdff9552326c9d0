//! Vantage Core
//!
//! This crate turns one intercepted call into a uniform lifecycle of
//! observability events, without changing what the call itself does:
//!
//! - [`classify`]: decide which completion convention the dispatched
//!   value uses (callback, promise, trailing callback in a sequence, or
//!   none)
//! - [`adapter`]: wrap the classified completion so `error`/`async-end`
//!   fire exactly once when the real operation finishes
//! - [`Context`]: capture the execution context at `start` and restore it
//!   when the completion later runs
//! - [`InvocationTracker`]: the per-call state machine publishing `start`,
//!   a guaranteed `end`, and the synchronous failure path
//! - [`instrument`]: compose an operation with all of the above
//!
//! # Quick Start
//!
//! ```ignore
//! use vantage_core::{InvocationTracker, instrument, DefaultExtractor, CommandCall};
//! use vantage_events::EventBus;
//! use vantage_model::{InvocationDescriptor, Value};
//! use std::sync::Arc;
//!
//! let bus = EventBus::new();
//! let tracker = Arc::new(InvocationTracker::new(&bus, "redis:command"));
//!
//! let op = |call: CommandCall| Ok(Value::Unit);
//! let instrumented = instrument(tracker, Arc::new(DefaultExtractor), op);
//! ```

pub mod adapter;
pub mod classify;
pub mod config;
pub mod context;
pub mod intercept;
pub mod tracker;

pub use adapter::{adapt, wrap_callback};
pub use classify::{CompletionHandle, classify};
pub use config::InstrumentationConfig;
pub use context::{Context, ContextGuard};
pub use intercept::{CommandCall, DefaultExtractor, DescriptorExtractor, instrument};
pub use tracker::{CompletionScope, InvocationTracker};
