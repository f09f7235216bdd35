//! Error types for the operation engine

use thiserror::Error;

/// Errors raised while composing, transforming, applying or decoding operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpError {
    /// The second operation does not describe the document produced by the first
    #[error("cannot compose operations: {reason}\n  a: {a}\n  b: {b}")]
    Compose { reason: String, a: String, b: String },

    /// The two operations do not describe the same base document
    #[error("cannot transform operations: {reason}\n  client: {client}\n  server: {server}")]
    Transform {
        reason: String,
        client: String,
        server: String,
    },

    /// The operation does not fit the document it is applied to
    #[error("cannot apply operation: {0}")]
    Apply(String),

    /// A component violates the component invariants
    #[error("malformed component: {0}")]
    Malformed(String),

    /// A coordinate outside of the document
    #[error("position {line}:{column} is outside of the document")]
    Position { line: usize, column: usize },

    /// A revision that does not follow the tracked one
    #[error("revision mismatch: expected {expected}, received {received}")]
    Revision { expected: u64, received: u64 },

    /// A transform queue call made in the wrong state
    #[error("transform queue: {0}")]
    Queue(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl From<serde_json::Error> for OpError {
    fn from(err: serde_json::Error) -> Self {
        OpError::Serialization(err.to_string())
    }
}

/// Result type for operation engine calls
pub type Result<T> = std::result::Result<T, OpError>;
