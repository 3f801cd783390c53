//! Error types for the transport layer.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use crate::server::EndpointError;

/// Reasons a single request line is answered with an error response.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The line is not a JSON object naming a tool.
    #[error("malformed request: {message}")]
    Malformed {
        /// Description of the problem.
        message: String,
    },

    /// The line exceeds the request size limit.
    #[error("request exceeds the {limit} byte limit")]
    TooLarge {
        /// Maximum accepted line length in bytes.
        limit: usize,
    },

    /// The `arguments` member is not an object.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        /// Description of the problem.
        message: String,
    },

    /// The endpoint rejected the call or its tool raised.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

impl RequestError {
    /// Returns the stable, kebab-case kind reported on the wire.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Malformed { .. } => "malformed-request",
            Self::TooLarge { .. } => "request-too-large",
            Self::InvalidArguments { .. } => "invalid-arguments",
            Self::Endpoint(error) => error.kind(),
        }
    }

    /// Creates a malformed request error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    /// Creates an invalid arguments error.
    #[must_use]
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }
}

/// Failures that end a session.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading a request or writing a response failed.
    #[error("transport I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A response could not be encoded.
    #[error("failed to encode response: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors surfaced while binding or running the socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The TCP host name could not be resolved.
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// The TCP host name resolved to no addresses.
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty {
        /// Configured host.
        host: String,
        /// Configured port.
        port: u16,
    },
    /// Binding the TCP listener failed.
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        /// Resolved address.
        addr: SocketAddr,
        /// Bind error.
        #[source]
        source: io::Error,
    },
    /// The listener could not be switched to non-blocking mode.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Unix sockets are not available on this platform.
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported for endpoint {endpoint}")]
    UnsupportedUnix {
        /// Configured endpoint.
        endpoint: String,
    },
    /// Binding the Unix listener failed.
    #[cfg(unix)]
    #[error("failed to bind unix listener at {path}: {source}")]
    BindUnix {
        /// Socket path.
        path: String,
        /// Bind error.
        #[source]
        source: io::Error,
    },
    /// Another process is already serving on the socket.
    #[cfg(unix)]
    #[error("existing unix socket {path} is already in use")]
    UnixInUse {
        /// Socket path.
        path: String,
    },
    /// The socket path exists but is not a socket.
    #[cfg(unix)]
    #[error("unix socket path {path} is not a socket")]
    UnixNotSocket {
        /// Socket path.
        path: String,
    },
    /// The existing socket path could not be inspected.
    #[cfg(unix)]
    #[error("failed to read metadata for unix socket {path}: {source}")]
    UnixMetadata {
        /// Socket path.
        path: String,
        /// Metadata error.
        #[source]
        source: io::Error,
    },
    /// Probing the existing socket failed unexpectedly.
    #[cfg(unix)]
    #[error("failed to connect to existing unix socket {path}: {source}")]
    UnixConnect {
        /// Socket path.
        path: String,
        /// Connection error.
        #[source]
        source: io::Error,
    },
    /// A stale socket file could not be removed.
    #[cfg(unix)]
    #[error("failed to remove stale unix socket {path}: {source}")]
    UnixCleanup {
        /// Socket path.
        path: String,
        /// Removal error.
        #[source]
        source: io::Error,
    },
    /// The accept loop panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}
