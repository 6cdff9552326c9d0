//! Instrumentation configuration.

/// Configuration for invocation tracking.
///
/// None of these settings change what the instrumented operation itself
/// does; they only shape what the instrumentation records. Subscriber
/// panic isolation is not configured here: it is a property of the event
/// bus the tracker publishes to, chosen when the bus is built.
#[derive(Debug, Clone)]
pub struct InstrumentationConfig {
    /// Log synchronous dispatch failures at the catch point.
    ///
    /// The failure's rendered chain is logged before the `error` event is
    /// published, so the log points at the original failing dispatch.
    pub log_sync_failures: bool,

    /// Maximum number of arguments copied into the invocation descriptor.
    ///
    /// `None` records all arguments. Commands with very large argument
    /// lists (bulk inserts) can be capped without affecting dispatch.
    pub max_recorded_arguments: Option<usize>,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            log_sync_failures: true,
            max_recorded_arguments: None,
        }
    }
}

impl InstrumentationConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log synchronous dispatch failures.
    pub fn with_sync_failure_logging(mut self, enabled: bool) -> Self {
        self.log_sync_failures = enabled;
        self
    }

    /// Cap the number of arguments recorded per descriptor.
    pub fn with_max_recorded_arguments(mut self, max: usize) -> Self {
        self.max_recorded_arguments = Some(max);
        self
    }
}
