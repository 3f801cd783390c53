//! Endpoint table served over the transport.
//!
//! [`register_tools`] publishes one [`ToolEndpoint`] per discovered tool plus
//! the `list_tools` and `verify` meta-endpoints on a [`ToolServer`]. The
//! table is built once at startup and shared read-only across connections.
//!
//! ## Response shape
//!
//! Tool endpoints return the normalized result object:
//!
//! ```json
//! {"success":true,"score":92,"grade":"A"}
//! {"success":false,"error":"mypy not installed"}
//! ```
//!
//! Errors raised by a tool are not translated here; they surface as
//! [`EndpointError::Tool`] and are reported by the transport.

mod adapter;
mod errors;
mod meta;


use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use anvil_tools::{Arguments, ToolSet};
use serde_json::Value;
use tracing::{info, warn};

pub use self::adapter::{KWARGS_KEY, ToolEndpoint, normalize, unwrap_kwargs};
pub use self::errors::EndpointError;
pub use self::meta::{
    DEFAULT_VERIFY_PATH, ExtraTools, LIST_TOOLS_ENDPOINT, ListToolsEndpoint, VERIFY_DESCRIPTION,
    VERIFY_ENDPOINT, VerifyEndpoint,
};

/// Tracing target for endpoint registration and dispatch.
pub(crate) const SERVER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::server");

/// A named operation callable over the transport.
pub trait Endpoint: Send + Sync {
    /// Human-readable description published with the endpoint.
    fn description(&self) -> String;

    /// Invokes the endpoint with keyword arguments.
    ///
    /// # Errors
    ///
    /// Returns an [`EndpointError`] when the arguments are rejected or the
    /// underlying tool raises.
    fn call(&self, arguments: Arguments) -> Result<Value, EndpointError>;
}

/// Table of published endpoints keyed by name.
#[derive(Default)]
pub struct ToolServer {
    endpoints: BTreeMap<String, Arc<dyn Endpoint>>,
}

impl ToolServer {
    /// Creates an empty server.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `endpoint` under `name`, replacing any earlier endpoint of
    /// the same name.
    pub fn register(&mut self, name: impl Into<String>, endpoint: Arc<dyn Endpoint>) {
        let key = name.into();
        if self.endpoints.insert(key.clone(), endpoint).is_some() {
            warn!(
                target: SERVER_TARGET,
                endpoint = %key,
                "endpoint registered more than once; keeping the later registration"
            );
        }
    }

    /// Invokes the endpoint published under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError::UnknownEndpoint`] when nothing is published
    /// under `name`, otherwise whatever the endpoint returns.
    pub fn call(&self, name: &str, arguments: Arguments) -> Result<Value, EndpointError> {
        let endpoint = self
            .endpoints
            .get(name)
            .ok_or_else(|| EndpointError::unknown_endpoint(name))?;
        endpoint.call(arguments)
    }

    /// Returns the description of the endpoint published under `name`.
    #[must_use]
    pub fn description(&self, name: &str) -> Option<String> {
        self.endpoints.get(name).map(|endpoint| endpoint.description())
    }

    /// Returns the published endpoint names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    /// Returns `true` when an endpoint is published under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.endpoints.contains_key(name)
    }

    /// Returns the number of published endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` when no endpoints are published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl fmt::Debug for ToolServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.endpoints.keys()).finish()
    }
}

/// Publishes every tool in `tools` plus the `list_tools` and `verify`
/// meta-endpoints.
///
/// `extra_tools` adds static entries to the `list_tools` listing only; it
/// does not publish endpoints. Meta-endpoints are registered last, so they
/// replace a discovered tool of the same name.
pub fn register_tools(server: &mut ToolServer, tools: &ToolSet, extra_tools: &ExtraTools) {
    for (name, tool) in tools {
        server.register(
            name.as_str(),
            Arc::new(ToolEndpoint::new(name.as_str(), Arc::clone(tool))),
        );
        info!(target: SERVER_TARGET, endpoint = %name, "registered tool endpoint");
    }

    server.register(
        LIST_TOOLS_ENDPOINT,
        Arc::new(ListToolsEndpoint::new(tools.clone(), extra_tools.clone())),
    );
    info!(target: SERVER_TARGET, endpoint = LIST_TOOLS_ENDPOINT, "registered meta-endpoint");

    server.register(VERIFY_ENDPOINT, Arc::new(VerifyEndpoint::new(tools.clone())));
    info!(target: SERVER_TARGET, endpoint = VERIFY_ENDPOINT, "registered meta-endpoint");
}
