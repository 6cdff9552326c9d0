//! Lifecycle events.

use vantage_model::{FailureValue, InvocationDescriptor};

/// The four lifecycle event kinds, one per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Published once per invocation, before dispatch.
    Start,
    /// Published once per invocation, immediately after dispatch returns
    /// or fails.
    End,
    /// Published at most once, when the real completion occurs.
    AsyncEnd,
    /// Published at most once, on either the synchronous or the
    /// asynchronous failure path.
    Error,
}

impl EventKind {
    /// All kinds, in lifecycle order.
    pub const ALL: [EventKind; 4] = [
        EventKind::Start,
        EventKind::End,
        EventKind::AsyncEnd,
        EventKind::Error,
    ];

    /// The channel-name suffix for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::End => "end",
            EventKind::AsyncEnd => "async-end",
            EventKind::Error => "error",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A lifecycle event published on a channel.
///
/// `End` and `AsyncEnd` carry no payload: they are unit markers, and
/// correlation flows through the bound context rather than the payload.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    /// An invocation is about to dispatch.
    Start(InvocationDescriptor),
    /// Dispatch returned or failed.
    End,
    /// The real completion occurred.
    AsyncEnd,
    /// The invocation failed, synchronously or asynchronously.
    Error(FailureValue),
}

impl LifecycleEvent {
    /// The kind of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            LifecycleEvent::Start(_) => EventKind::Start,
            LifecycleEvent::End => EventKind::End,
            LifecycleEvent::AsyncEnd => EventKind::AsyncEnd,
            LifecycleEvent::Error(_) => EventKind::Error,
        }
    }

    /// The descriptor, if this is a `start` event.
    pub fn descriptor(&self) -> Option<&InvocationDescriptor> {
        match self {
            LifecycleEvent::Start(descriptor) => Some(descriptor),
            _ => None,
        }
    }

    /// The failure, if this is an `error` event.
    pub fn failure(&self) -> Option<&FailureValue> {
        match self {
            LifecycleEvent::Error(failure) => Some(failure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        assert_eq!(EventKind::Start.as_str(), "start");
        assert_eq!(EventKind::AsyncEnd.as_str(), "async-end");
    }

    #[test]
    fn test_event_kind_accessor() {
        let event = LifecycleEvent::Start(InvocationDescriptor::new("GET"));
        assert_eq!(event.kind(), EventKind::Start);
        assert!(event.descriptor().is_some());
        assert!(event.failure().is_none());

        assert_eq!(LifecycleEvent::End.kind(), EventKind::End);
    }
}
