//! Tool server for the Anvil toolkit.
//!
//! `anvild` discovers the tools advertised by installed components and
//! publishes each one as a callable endpoint over a line-delimited JSON
//! transport. Alongside the tools it publishes two meta-endpoints:
//!
//! - `list_tools` lists every published tool with the summary line of its
//!   description.
//! - `verify` runs the `audit` and `init_check` tools against a project and,
//!   when `ast_impact` is installed, attaches impact context to every audit
//!   failure.
//!
//! Startup is a single pass: load configuration with `ortho_config`, install
//! structured telemetry, discover tools, build the endpoint table, then serve
//! standard I/O or a listening socket. The endpoint table is immutable once
//! built and shared across connections.

mod bootstrap;
mod health;
pub mod server;
pub mod telemetry;
pub mod transport;
pub mod verify;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, ServeError, StaticConfigLoader, SystemConfigLoader,
    bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
