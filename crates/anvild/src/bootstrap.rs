//! Startup orchestration: configuration, telemetry, discovery and serving.

use std::path::PathBuf;
use std::sync::Arc;

use anvil_config::{Config, SocketPreparationError};
use anvil_tools::{CatalogSource, ManifestCatalog, discover};
use ortho_config::OrthoError;
use thiserror::Error;

use crate::health::HealthReporter;
use crate::server::{ExtraTools, ToolServer, VERIFY_DESCRIPTION, VERIFY_ENDPOINT, register_tools};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{
    ListenerError, SocketListener, ToolConnectionHandler, TransportError, serve_stdio,
};

/// Source of the server configuration.
pub trait ConfigLoader: Send + Sync {
    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when no configuration can be produced.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader that always returns the same configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The listening socket's directory could not be prepared.
    #[error("failed to prepare listening socket: {source}")]
    Socket {
        /// Filesystem error reported while preparing the socket directory.
        #[source]
        source: SocketPreparationError,
    },
}

/// Errors that stop a running server.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The standard I/O session failed.
    #[error("standard I/O session failed: {0}")]
    Transport(#[from] TransportError),
    /// The socket listener could not be bound or stopped abnormally.
    #[error("socket listener failed: {0}")]
    Listener(#[from] ListenerError),
}

/// A bootstrapped server ready to accept requests.
#[derive(Debug)]
pub struct Daemon {
    config: Config,
    server: Arc<ToolServer>,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the published endpoint table.
    #[must_use]
    pub fn server(&self) -> &ToolServer {
        &self.server
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Serves requests until the input ends or the listener stops.
    ///
    /// Serves standard I/O unless a listening socket is configured, in which
    /// case every connection is served on its own thread.
    ///
    /// # Errors
    ///
    /// Returns [`ServeError`] when standard I/O fails or the socket cannot be
    /// bound.
    pub fn serve(&self) -> Result<(), ServeError> {
        let Some(endpoint) = self.config.listen() else {
            return Ok(serve_stdio(&self.server)?);
        };
        let handler = Arc::new(ToolConnectionHandler::new(Arc::clone(&self.server)));
        let handle = SocketListener::bind(endpoint)?.start(handler)?;
        Ok(handle.join()?)
    }
}

/// Bootstraps the server.
///
/// Loads configuration, installs telemetry, prepares the listening socket
/// directory, then discovers tools from `builtin` catalogs followed by the
/// configured manifest directories, and publishes them with the `list_tools`
/// and `verify` meta-endpoints.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry or socket
/// preparation fails. Discovery itself never fails.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: &dyn HealthReporter,
    builtin: &[&dyn CatalogSource],
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();
    let result = prepare(loader).map(|(config, telemetry)| {
        let server = build_server(&config, builtin);
        reporter.bootstrap_succeeded(&config, &server);
        Daemon {
            config,
            server: Arc::new(server),
            telemetry,
        }
    });
    if let Err(error) = &result {
        reporter.bootstrap_failed(error);
    }
    result
}

fn prepare(loader: &dyn ConfigLoader) -> Result<(Config, TelemetryHandle), BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    if let Some(endpoint) = config.listen() {
        endpoint
            .prepare_filesystem()
            .map_err(|source| BootstrapError::Socket { source })?;
    }
    Ok((config, telemetry))
}

fn build_server(config: &Config, builtin: &[&dyn CatalogSource]) -> ToolServer {
    let manifests = ManifestCatalog::new(
        config
            .plugin_dirs()
            .iter()
            .map(|dir| PathBuf::from(dir.as_std_path()))
            .collect(),
    );
    let mut sources: Vec<&dyn CatalogSource> = builtin.to_vec();
    sources.push(&manifests);
    let tools = discover(&sources, config.tool_group());

    let extra_tools = ExtraTools::from([(VERIFY_ENDPOINT.to_owned(), VERIFY_DESCRIPTION.to_owned())]);
    let mut server = ToolServer::new();
    register_tools(&mut server, &tools, &extra_tools);
    server
}
