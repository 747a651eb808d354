//! Error types for the core library.

use crate::node::NodeDescriptor;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
///
/// None of these are transient: each one means a caller broke the contract
/// with the ring core, so they are surfaced rather than retried.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A `host:port` string could not be parsed into a descriptor.
    #[error("Invalid node descriptor '{input}': {reason}")]
    InvalidDescriptor { input: String, reason: String },

    /// A message was handed to a core it is not addressed to.
    #[error("Message {kind} for {destination} delivered to {node}")]
    Misdirected {
        kind: &'static str,
        destination: NodeDescriptor,
        node: NodeDescriptor,
    },

    /// The in-memory topology has no core registered for a destination.
    #[error("Unknown node: {0}")]
    UnknownNode(NodeDescriptor),
}

impl Error {
    pub(crate) fn invalid_descriptor(input: &str, reason: impl Into<String>) -> Self {
        Error::InvalidDescriptor {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
