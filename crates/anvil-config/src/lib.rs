//! Layered configuration for the Anvil tool server.
//!
//! [`Config`] is assembled by `ortho_config` from, in increasing precedence,
//! built-in defaults, a TOML configuration file (`--config-path` or
//! `ANVIL_CONFIG_PATH`), `ANVIL_*` environment variables, and command-line
//! flags.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;
mod socket;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_TOOL_GROUP, PLUGIN_SUBDIRECTORY, default_log_filter,
    default_log_filter_string, default_log_format, default_plugin_dirs, default_tool_group,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{DEFAULT_TCP_PORT, SocketEndpoint, SocketParseError, SocketPreparationError};

/// Runtime configuration shared by the daemon and its tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ANVIL")]
pub struct Config {
    /// `tracing` filter directive, e.g. `info` or `anvild=debug`.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log events.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Directories scanned for component manifests. Missing directories are
    /// skipped at discovery time.
    #[ortho_config(default = default_plugin_dirs(), merge_strategy = "append")]
    pub plugin_dirs: Vec<Utf8PathBuf>,
    /// Extension-point group whose advertisements are discovered.
    #[ortho_config(default = default_tool_group())]
    pub tool_group: String,
    /// Socket to listen on. Standard I/O is served when absent.
    pub listen: Option<SocketEndpoint>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            plugin_dirs: default_plugin_dirs(),
            tool_group: default_tool_group(),
            listen: None,
        }
    }
}

impl Config {
    /// Loads configuration from the process arguments, environment, and any
    /// configuration file.
    pub fn load() -> Result<Self, Arc<OrthoError>> {
        Self::load_from_iter(std::env::args_os())
    }

    /// Loads configuration from an explicit argument list. The first item is
    /// treated as the program name.
    pub fn load_from_iter<I, T>(args: I) -> Result<Self, Arc<OrthoError>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as OrthoConfig>::load_from_iter(args)
    }

    /// Returns the configured log filter.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the manifest directories in scan order.
    #[must_use]
    pub fn plugin_dirs(&self) -> &[Utf8PathBuf] {
        &self.plugin_dirs
    }

    /// Returns the extension-point group to discover.
    #[must_use]
    pub fn tool_group(&self) -> &str {
        self.tool_group.as_str()
    }

    /// Returns the listening socket, if one is configured.
    #[must_use]
    pub const fn listen(&self) -> Option<&SocketEndpoint> {
        self.listen.as_ref()
    }
}
