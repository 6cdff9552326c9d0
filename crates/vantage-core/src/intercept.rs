//! The decorator interface interceptors compose with.
//!
//! Method interception itself (locating a client library's dispatch
//! method, version matching, module loading) lives outside this core.
//! What the core offers instead of in-place patching is composition: an
//! interceptor is a pure function from the original operation to an
//! instrumented operation of the same shape.
//!
//! Per-library adapters supply a [`DescriptorExtractor`] that reads the
//! client's representation of a call ([`CommandCall`]) into an
//! [`InvocationDescriptor`]; [`instrument`] does the rest.

use std::sync::Arc;

use vantage_model::{ConnectionInfo, FailureValue, InvocationDescriptor, Value};

use crate::tracker::InvocationTracker;

/// A client library's view of one command dispatch.
#[derive(Debug, Clone)]
pub struct CommandCall {
    /// The command name.
    pub command: String,
    /// The command arguments.
    pub arguments: Vec<Value>,
    /// The database selected on the issuing connection, if any.
    pub database: Option<i64>,
    /// Connection metadata of the issuing client.
    pub connection: ConnectionInfo,
}

impl CommandCall {
    /// Create a call record for a command.
    pub fn new(command: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            command: command.into(),
            arguments,
            database: None,
            connection: ConnectionInfo::default(),
        }
    }

    /// Set the selected database.
    pub fn with_database(mut self, database: i64) -> Self {
        self.database = Some(database);
        self
    }

    /// Set the connection metadata.
    pub fn with_connection(mut self, connection: ConnectionInfo) -> Self {
        self.connection = connection;
        self
    }
}

/// Extracts an invocation descriptor from a client's call representation.
pub trait DescriptorExtractor: Send + Sync {
    /// Build the descriptor for one call.
    fn extract(&self, call: &CommandCall) -> InvocationDescriptor;
}

impl<F> DescriptorExtractor for F
where
    F: Fn(&CommandCall) -> InvocationDescriptor + Send + Sync,
{
    fn extract(&self, call: &CommandCall) -> InvocationDescriptor {
        self(call)
    }
}

/// The identity extractor: the descriptor is the call, field for field.
pub struct DefaultExtractor;

impl DescriptorExtractor for DefaultExtractor {
    fn extract(&self, call: &CommandCall) -> InvocationDescriptor {
        let mut descriptor = InvocationDescriptor::new(call.command.clone())
            .with_arguments(call.arguments.clone())
            .with_connection(call.connection.clone());
        descriptor.database = call.database;
        descriptor
    }
}

/// Compose an operation with instrumentation.
///
/// The returned operation has the same shape as `op`; callers that held
/// the original can hold the instrumented one instead. Completion values
/// returned by `op` are classified and adapted; everything else, from
/// argument handling to failure identity, is untouched.
pub fn instrument<Op>(
    tracker: Arc<InvocationTracker>,
    extractor: Arc<dyn DescriptorExtractor>,
    op: Op,
) -> impl Fn(CommandCall) -> Result<Value, FailureValue>
where
    Op: Fn(CommandCall) -> Result<Value, FailureValue>,
{
    move |call| {
        let descriptor = extractor.extract(&call);
        tracker.dispatch(descriptor, || op(call))
    }
}
