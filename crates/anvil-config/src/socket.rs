//! Listening endpoints for the socket transport.
//!
//! Endpoints are written as URLs: `unix:///run/anvil/anvild.sock` or
//! `tcp://127.0.0.1:9780`. An absolute path on its own is shorthand for a
//! Unix socket, and a TCP address without a port listens on
//! [`DEFAULT_TCP_PORT`].

use std::fmt;
use std::fs::DirBuilder;
use std::io;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::{Host, Url};

/// Port used when a `tcp://` endpoint omits one.
pub const DEFAULT_TCP_PORT: u16 = 9780;

/// Address the tool server listens on when not serving standard I/O.
///
/// Configuration files spell it as a table tagged by `transport`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "transport", rename_all = "snake_case")]
pub enum SocketEndpoint {
    /// Unix domain socket endpoint.
    Unix {
        /// Filesystem path of the socket.
        path: Utf8PathBuf,
    },
    /// TCP socket endpoint.
    Tcp {
        /// Host name or address to bind, without IPv6 brackets.
        host: String,
        /// Port to bind.
        port: u16,
    },
}

impl SocketEndpoint {
    /// Builds a Unix domain socket endpoint.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// Builds a TCP socket endpoint.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// Returns the Unix socket path when the endpoint uses the Unix transport.
    #[must_use]
    pub fn unix_path(&self) -> Option<&Utf8Path> {
        match self {
            Self::Unix { path } => Some(path.as_ref()),
            Self::Tcp { .. } => None,
        }
    }

    /// Makes sure a Unix socket can be bound: its parent directory is
    /// created owner-only when missing and must be a directory when present.
    /// TCP endpoints need no preparation.
    pub fn prepare_filesystem(&self) -> Result<(), SocketPreparationError> {
        let Some(path) = self.unix_path() else {
            return Ok(());
        };
        let parent = socket_directory(path)?;
        if parent.exists() {
            return if parent.is_dir() {
                Ok(())
            } else {
                Err(SocketPreparationError::NotADirectory {
                    path: parent.to_path_buf(),
                })
            };
        }

        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(parent.as_std_path())
            .map_err(|source| SocketPreparationError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })
    }
}

fn socket_directory(path: &Utf8Path) -> Result<&Utf8Path, SocketPreparationError> {
    path.parent()
        .filter(|parent| !parent.as_str().is_empty())
        .ok_or_else(|| SocketPreparationError::MissingParent {
            path: path.to_path_buf(),
        })
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(formatter, "unix://{path}"),
            Self::Tcp { host, port } if host.contains(':') => {
                write!(formatter, "tcp://[{host}]:{port}")
            }
            Self::Tcp { host, port } => write!(formatter, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for SocketEndpoint {
    type Err = SocketParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if Utf8Path::new(input).is_absolute() {
            return Ok(Self::unix(input));
        }
        let url = Url::parse(input)?;
        match url.scheme() {
            "unix" => parse_unix(input, &url),
            "tcp" => parse_tcp(input, &url),
            other => Err(SocketParseError::UnsupportedScheme(other.to_owned())),
        }
    }
}

fn parse_unix(input: &str, url: &Url) -> Result<SocketEndpoint, SocketParseError> {
    if url.host_str().is_some_and(|host| !host.is_empty()) {
        return Err(SocketParseError::UnixHost(input.to_owned()));
    }
    let path = url.path();
    if path.is_empty() || path == "/" {
        return Err(SocketParseError::MissingUnixPath(input.to_owned()));
    }
    Ok(SocketEndpoint::unix(path))
}

fn parse_tcp(input: &str, url: &Url) -> Result<SocketEndpoint, SocketParseError> {
    let host = match url.host() {
        Some(Host::Domain(name)) if !name.is_empty() => name.to_owned(),
        Some(Host::Ipv4(address)) => address.to_string(),
        Some(Host::Ipv6(address)) => address.to_string(),
        _ => return Err(SocketParseError::MissingHost(input.to_owned())),
    };
    Ok(SocketEndpoint::tcp(
        host,
        url.port().unwrap_or(DEFAULT_TCP_PORT),
    ))
}

/// Errors encountered while parsing a [`SocketEndpoint`] from text.
#[derive(Debug, Error)]
pub enum SocketParseError {
    /// Scheme was neither `unix` nor `tcp`.
    #[error("unsupported socket scheme '{0}'")]
    UnsupportedScheme(String),
    /// TCP host name was missing.
    #[error("missing TCP host in '{0}'")]
    MissingHost(String),
    /// Unix socket path was absent.
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
    /// A Unix URL named a host, usually a missing third slash.
    #[error("Unix socket URL '{0}' names a host; write unix:///absolute/path")]
    UnixHost(String),
    /// URL failed to parse.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

/// Errors raised when preparing socket directories.
#[derive(Debug, Error)]
pub enum SocketPreparationError {
    /// The socket path has no parent directory to create.
    #[error("socket path '{path}' has no parent directory")]
    MissingParent {
        /// Offending socket path.
        path: Utf8PathBuf,
    },
    /// The parent path exists but is not a directory.
    #[error("socket directory '{path}' is not a directory")]
    NotADirectory {
        /// Path that should have been a directory.
        path: Utf8PathBuf,
    },
    /// Creating the parent directory failed.
    #[error("failed to create socket directory '{path}': {source}")]
    CreateDirectory {
        /// Directory that could not be created.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;

    fn temp_path(dir: &TempDir, relative: &str) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().join(relative)).expect("utf-8 path")
    }

    #[rstest]
    #[case::unix_url("unix:///run/anvil/anvild.sock", SocketEndpoint::unix("/run/anvil/anvild.sock"))]
    #[case::bare_path("/run/anvil/anvild.sock", SocketEndpoint::unix("/run/anvil/anvild.sock"))]
    #[case::tcp("tcp://127.0.0.1:9000", SocketEndpoint::tcp("127.0.0.1", 9000))]
    #[case::default_port("tcp://localhost", SocketEndpoint::tcp("localhost", DEFAULT_TCP_PORT))]
    #[case::ipv6("tcp://[::1]:9000", SocketEndpoint::tcp("::1", 9000))]
    fn parses_endpoints(#[case] input: &str, #[case] expected: SocketEndpoint) {
        let endpoint: SocketEndpoint = input.parse().expect("parse");
        assert_eq!(endpoint, expected);
    }

    #[rstest]
    #[case::unix(SocketEndpoint::unix("/run/anvil/anvild.sock"), "unix:///run/anvil/anvild.sock")]
    #[case::tcp(SocketEndpoint::tcp("127.0.0.1", 9780), "tcp://127.0.0.1:9780")]
    #[case::ipv6(SocketEndpoint::tcp("::1", 9780), "tcp://[::1]:9780")]
    fn display_parses_back(#[case] endpoint: SocketEndpoint, #[case] text: &str) {
        assert_eq!(endpoint.to_string(), text);
        assert_eq!(text.parse::<SocketEndpoint>().expect("parse"), endpoint);
    }

    #[test]
    fn unix_url_with_host_is_rejected() {
        let error = "unix://run/anvild.sock"
            .parse::<SocketEndpoint>()
            .expect_err("host in unix url");
        assert!(matches!(error, SocketParseError::UnixHost(_)));
    }

    #[rstest]
    #[case::scheme("http://localhost:80")]
    #[case::unix_root("unix:///")]
    #[case::garbage("not a url")]
    fn rejects_invalid_endpoints(#[case] input: &str) {
        assert!(input.parse::<SocketEndpoint>().is_err(), "accepted {input}");
    }

    #[test]
    fn prepare_creates_missing_parent() {
        let dir = TempDir::new().expect("temp dir");
        let path = temp_path(&dir, "nested/anvild.sock");

        SocketEndpoint::unix(path.clone())
            .prepare_filesystem()
            .expect("prepare");

        assert!(path.parent().expect("parent").is_dir());
    }

    #[test]
    fn prepare_rejects_file_in_place_of_directory() {
        let dir = TempDir::new().expect("temp dir");
        let blocker = temp_path(&dir, "blocker");
        std::fs::write(&blocker, b"").expect("write blocker");

        let error = SocketEndpoint::unix(blocker.join("anvild.sock"))
            .prepare_filesystem()
            .expect_err("parent is a file");
        assert!(matches!(error, SocketPreparationError::NotADirectory { .. }));
    }

    #[test]
    fn prepare_rejects_bare_file_name() {
        let endpoint = SocketEndpoint::unix("anvild.sock");
        let error = endpoint.prepare_filesystem().expect_err("no parent");
        assert!(matches!(error, SocketPreparationError::MissingParent { .. }));
    }

    #[test]
    fn tcp_needs_no_preparation() {
        assert!(SocketEndpoint::tcp("127.0.0.1", 9780).prepare_filesystem().is_ok());
    }
}
