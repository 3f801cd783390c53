//! Connection handling for the socket listener.

use std::io::{self, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use tracing::{debug, warn};

use super::{TRANSPORT_TARGET, serve_session};
use crate::server::ToolServer;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Stream types accepted by the socket listener.
pub(crate) enum ConnectionStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl ConnectionStream {
    /// Opens an independent handle to the same connection.
    pub(crate) fn try_clone(&self) -> io::Result<Self> {
        match self {
            Self::Tcp(stream) => stream.try_clone().map(Self::Tcp),
            #[cfg(unix)]
            Self::Unix(stream) => stream.try_clone().map(Self::Unix),
        }
    }
}

impl Read for ConnectionStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.read(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.read(buf),
        }
    }
}

impl Write for ConnectionStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Tcp(stream) => stream.write(buf),
            #[cfg(unix)]
            Self::Unix(stream) => stream.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Tcp(stream) => stream.flush(),
            #[cfg(unix)]
            Self::Unix(stream) => stream.flush(),
        }
    }
}

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: ConnectionStream);
}

/// Serves a full JSONL session on each accepted connection.
#[derive(Debug, Clone)]
pub(crate) struct ToolConnectionHandler {
    server: Arc<ToolServer>,
}

impl ToolConnectionHandler {
    pub(crate) const fn new(server: Arc<ToolServer>) -> Self {
        Self { server }
    }
}

impl ConnectionHandler for ToolConnectionHandler {
    fn handle(&self, stream: ConnectionStream) {
        let reader = match stream.try_clone() {
            Ok(reader) => reader,
            Err(error) => {
                warn!(target: TRANSPORT_TARGET, %error, "failed to clone connection");
                return;
            }
        };
        match serve_session(&self.server, BufReader::new(reader), stream) {
            Ok(()) => debug!(target: TRANSPORT_TARGET, "client disconnected"),
            Err(error) => warn!(target: TRANSPORT_TARGET, %error, "connection handler error"),
        }
    }
}
