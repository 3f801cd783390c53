//! Tool contract, catalog sources, and discovery for Anvil.
//!
//! The `anvil-tools` crate defines what a tool is and how installed tools are
//! found. A tool is any type implementing [`Tool`]: it has a public name and
//! executes with keyword arguments, returning an [`ExecutionResult`]. Tools
//! are published by independently installed components under an
//! extension-point group (by default [`DEFAULT_TOOL_GROUP`]).
//!
//! # Architecture
//!
//! Components advertise `(name, factory)` pairs through a [`CatalogSource`].
//! Two sources ship with the crate: a compiled-in [`StaticCatalog`] and a
//! [`ManifestCatalog`] that reads JSON component manifests from plugin
//! directories. Manifest entries are backed by [`process::ProcessTool`],
//! which runs the declared executable and exchanges one JSON line in each
//! direction. [`discover`] instantiates every advertisement into a
//! [`ToolSet`], logging and skipping any entry that fails.
//!
//! # Example
//!
//! ```
//! use anvil_tools::{
//!     Arguments, DEFAULT_TOOL_GROUP, ExecutionResult, StaticCatalog, Tool, ToolError, discover,
//! };
//!
//! struct Audit;
//!
//! impl Tool for Audit {
//!     fn name(&self) -> &str {
//!         "audit"
//!     }
//!
//!     fn execute(&self, _: &Arguments) -> Result<ExecutionResult, ToolError> {
//!         Ok(ExecutionResult::default())
//!     }
//! }
//!
//! let catalog = StaticCatalog::new("anvil-core")
//!     .advertise(DEFAULT_TOOL_GROUP, "audit", || Ok(Box::new(Audit) as Box<dyn Tool>))
//!     .advertise(DEFAULT_TOOL_GROUP, "broken", || {
//!         Err(ToolError::construction("broken", "missing dependency"))
//!     });
//!
//! let tools = discover(&[&catalog], DEFAULT_TOOL_GROUP);
//! assert_eq!(tools.names().collect::<Vec<_>>(), vec!["audit"]);
//! ```

pub mod catalog;
pub mod contract;
pub mod discovery;
pub mod error;
pub mod manifest;
pub mod process;
pub mod protocol;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

#[cfg(test)]
mod tests;

pub use self::catalog::{
    Advertisement, CatalogSource, DEFAULT_TOOL_GROUP, ManifestCatalog, StaticCatalog, ToolFactory,
};
pub use self::contract::{Arguments, ExecutionResult, ResultData, Tool, summary_line};
pub use self::discovery::{ToolSet, discover};
pub use self::error::{CatalogError, ToolError};
pub use self::manifest::{ComponentManifest, ToolManifest};
pub use self::protocol::ToolRequest;
