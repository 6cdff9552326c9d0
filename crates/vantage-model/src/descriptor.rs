//! Invocation descriptors.
//!
//! A descriptor is the immutable record built once per intercepted call and
//! published as the `start` payload. It carries what a per-library adapter
//! could extract from the client's internal representation: the command
//! name, its arguments, the selected database, and connection metadata.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::Value;

/// Unique identifier for one invocation.
///
/// Carried by the descriptor and by the context bound to the invocation's
/// completion, so subscribers can correlate terminal events with the start
/// event they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Create a new random invocation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InvocationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection metadata for the client issuing the command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    /// Remote host, if known.
    pub host: Option<String>,
    /// Remote port, if known.
    pub port: Option<u16>,
    /// Additional client-specific connection options.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ConnectionInfo {
    /// Create connection info for a host/port pair.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(host.into()),
            port: Some(port),
            extra: serde_json::Map::new(),
        }
    }

    /// Add a client-specific connection option.
    pub fn with_option(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Immutable record describing one intercepted invocation.
#[derive(Debug, Clone)]
pub struct InvocationDescriptor {
    /// Unique ID for this invocation.
    pub invocation: InvocationId,
    /// The command name.
    pub command: String,
    /// The command arguments, as passed to the client.
    pub arguments: Vec<Value>,
    /// The database selected on the connection, if any.
    pub database: Option<i64>,
    /// Connection metadata.
    pub connection: ConnectionInfo,
}

impl InvocationDescriptor {
    /// Create a descriptor for a command with no arguments.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            invocation: InvocationId::new(),
            command: command.into(),
            arguments: Vec::new(),
            database: None,
            connection: ConnectionInfo::default(),
        }
    }

    /// Set the command arguments.
    pub fn with_arguments(mut self, arguments: Vec<Value>) -> Self {
        self.arguments = arguments;
        self
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

    /// Render the descriptor as JSON for consumers that want a plain
    /// record; live handles among the arguments are replaced with markers.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "invocation": self.invocation.to_string(),
            "command": self.command,
            "arguments": self.arguments.iter().map(Value::to_json_lossy).collect::<Vec<_>>(),
            "database": self.database,
            "connection": serde_json::to_value(&self.connection).unwrap_or(serde_json::Value::Null),
        })
    }
}
