//! Structured health reporting for startup events.

use anvil_config::Config;

use crate::bootstrap::BootstrapError;
use crate::server::ToolServer;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer notified as the server starts.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked once the endpoint table is built.
    fn bootstrap_succeeded(&self, config: &Config, server: &ToolServer);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);
}

/// Reporter that records startup events with `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting tool server bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config, server: &ToolServer) {
        let endpoints: Vec<&str> = server.names().collect();
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            count = endpoints.len(),
            endpoints = ?endpoints,
            tool_group = %config.tool_group(),
            listen = ?config.listen().map(ToString::to_string),
            log_format = ?config.log_format(),
            "tool server ready"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "tool server bootstrap failed"
        );
    }
}
