//! Domain errors raised while discovering and executing tools.
//!
//! All errors use `thiserror`-derived enums with structured context so callers
//! can inspect the failure programmatically. I/O errors are wrapped in `Arc`
//! to satisfy the `result_large_err` Clippy lint.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised by a tool while it executes, or while it is being built.
///
/// A tool that *reports* a failure returns an
/// [`ExecutionResult`](crate::ExecutionResult) with `success == false`
/// instead; `ToolError` is reserved for failures the tool could not express
/// as a result at all.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The tool raised an error while executing.
    #[error("tool '{name}' failed: {message}")]
    Execution {
        /// Tool name.
        name: String,
        /// Human-readable failure description.
        message: String,
    },

    /// The tool rejected its keyword arguments.
    #[error("tool '{name}' rejected its arguments: {message}")]
    InvalidArguments {
        /// Tool name.
        name: String,
        /// Description of the rejected argument.
        message: String,
    },

    /// The tool could not be constructed by its factory.
    #[error("tool '{name}' could not be constructed: {message}")]
    Construction {
        /// Advertised tool name.
        name: String,
        /// Human-readable failure description.
        message: String,
    },

    /// The tool process could not be spawned.
    #[error("tool '{name}' failed to start: {message}")]
    SpawnFailed {
        /// Tool name.
        name: String,
        /// Human-readable failure description.
        message: String,
        /// Optional underlying I/O error.
        #[source]
        source: Option<Arc<std::io::Error>>,
    },

    /// The tool did not complete within the configured timeout.
    #[error("tool '{name}' timed out after {timeout_secs}s")]
    Timeout {
        /// Tool name.
        name: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The tool process exited with a non-zero status code.
    #[error("tool '{name}' exited with non-zero status {status}")]
    NonZeroExit {
        /// Tool name.
        name: String,
        /// Process exit status.
        status: i32,
    },

    /// The tool request could not be serialized to JSON.
    #[error("failed to serialise tool request: {0}")]
    SerializeRequest(#[source] serde_json::Error),

    /// The tool response could not be deserialized from JSON.
    #[error("failed to deserialise tool response: {message}")]
    DeserializeResponse {
        /// Human-readable description of the parse failure.
        message: String,
        /// Optional underlying JSON error.
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The tool produced output that does not conform to the protocol.
    #[error("tool '{name}' wrote invalid output: {message}")]
    InvalidOutput {
        /// Tool name.
        name: String,
        /// Description of the protocol violation.
        message: String,
    },

    /// An I/O error occurred while communicating with the tool process.
    #[error("I/O error communicating with tool '{name}': {source}")]
    Io {
        /// Tool name.
        name: String,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A tool manifest entry failed validation.
    #[error("manifest error: {message}")]
    Manifest {
        /// Description of the validation failure.
        message: String,
    },

    /// The tool executable was not found on the filesystem.
    #[error("tool '{name}' executable not found: {path}")]
    ExecutableNotFound {
        /// Tool name.
        name: String,
        /// Path that was checked.
        path: PathBuf,
    },
}

impl ToolError {
    /// Creates an execution error for an in-process tool.
    #[must_use]
    pub fn execution(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid arguments error.
    #[must_use]
    pub fn invalid_arguments(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a construction error reported by a tool factory.
    #[must_use]
    pub fn construction(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Construction {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while enumerating advertisements from a catalog source.
///
/// A catalog error affects a single manifest file; the remaining entries of
/// the catalog are still enumerated.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A catalog directory exists but could not be listed.
    #[error("failed to list catalog directory '{path}': {source}")]
    ReadDirectory {
        /// Directory that was listed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A manifest file could not be read.
    #[error("failed to read manifest '{path}': {source}")]
    ReadManifest {
        /// Manifest path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A manifest file is not valid JSON or does not match the schema.
    #[error("failed to parse manifest '{path}': {source}")]
    ParseManifest {
        /// Manifest path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A manifest parsed but one of its entries is invalid.
    #[error("invalid manifest '{path}': {source}")]
    InvalidManifest {
        /// Manifest path.
        path: PathBuf,
        /// Validation failure.
        #[source]
        source: ToolError,
    },
}
