//! Error types for endpoint invocation.

use anvil_tools::ToolError;
use thiserror::Error;

/// Errors surfaced while invoking a published endpoint.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// No endpoint is published under the requested name.
    #[error("unknown endpoint: {name}")]
    UnknownEndpoint {
        /// Requested endpoint name.
        name: String,
    },

    /// Arguments were rejected before reaching a tool.
    #[error("invalid arguments for '{endpoint}': {message}")]
    InvalidArguments {
        /// Endpoint that rejected the arguments.
        endpoint: String,
        /// Description of the problem.
        message: String,
    },

    /// A tool raised instead of returning a result.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The endpoint's output could not be encoded as JSON.
    #[error("failed to encode endpoint output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl EndpointError {
    /// Returns the stable, kebab-case kind reported on the wire.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnknownEndpoint { .. } => "unknown-endpoint",
            Self::InvalidArguments { .. } => "invalid-arguments",
            Self::Tool(_) => "tool-failed",
            Self::Encode(_) => "internal",
        }
    }

    /// Creates an unknown endpoint error.
    #[must_use]
    pub fn unknown_endpoint(name: impl Into<String>) -> Self {
        Self::UnknownEndpoint { name: name.into() }
    }

    /// Creates an invalid arguments error.
    #[must_use]
    pub fn invalid_arguments(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}
