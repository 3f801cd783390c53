//! Catalog sources that advertise tools under extension-point groups.
//!
//! A catalog is the installed-component metadata that discovery scans. Each
//! [`CatalogSource`] yields [`Advertisement`]s: a tool name paired with a
//! zero-argument [`ToolFactory`]. Discovery never assumes a particular
//! mechanism; the two sources shipped here are a compiled-in registration
//! table ([`StaticCatalog`]) and a directory of JSON manifests
//! ([`ManifestCatalog`]).

mod manifest_dir;
mod static_table;


use std::fmt;
use std::sync::Arc;

use crate::contract::Tool;
use crate::error::{CatalogError, ToolError};

pub use self::manifest_dir::ManifestCatalog;
pub use self::static_table::StaticCatalog;

/// Extension-point group scanned when no other group is configured.
pub const DEFAULT_TOOL_GROUP: &str = "anvil.tools";

/// Builds a tool instance with no arguments.
///
/// Implemented for every `Fn() -> Result<Box<dyn Tool>, ToolError>`
/// closure, so compiled-in tables can register constructors directly.
pub trait ToolFactory: Send + Sync {
    /// Constructs a fresh tool instance.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] when a dependency of the tool is missing or
    /// its constructor fails.
    fn create(&self) -> Result<Box<dyn Tool>, ToolError>;
}

impl<F> ToolFactory for F
where
    F: Fn() -> Result<Box<dyn Tool>, ToolError> + Send + Sync,
{
    fn create(&self) -> Result<Box<dyn Tool>, ToolError> {
        self()
    }
}

/// A `(name, factory)` pair published by an installed component.
///
/// The advertised name is authoritative for the discovered tool set, even
/// when the constructed tool reports a different [`Tool::name`].
#[derive(Clone)]
pub struct Advertisement {
    name: String,
    component: String,
    factory: Arc<dyn ToolFactory>,
}

impl Advertisement {
    /// Creates an advertisement.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        component: impl Into<String>,
        factory: Arc<dyn ToolFactory>,
    ) -> Self {
        Self {
            name: name.into(),
            component: component.into(),
            factory,
        }
    }

    /// Returns the advertised tool name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the name of the component that published the advertisement.
    #[must_use]
    pub const fn component(&self) -> &str {
        self.component.as_str()
    }

    /// Constructs the advertised tool.
    ///
    /// # Errors
    ///
    /// Propagates the factory's [`ToolError`].
    pub fn load(&self) -> Result<Box<dyn Tool>, ToolError> {
        self.factory.create()
    }
}

impl fmt::Debug for Advertisement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Advertisement")
            .field("name", &self.name)
            .field("component", &self.component)
            .finish_non_exhaustive()
    }
}

/// Source of advertisements, such as a registration table or a manifest
/// directory.
pub trait CatalogSource {
    /// Human-readable label used in diagnostics.
    fn label(&self) -> &str;

    /// Lists advertisements published under `group`, in a stable order.
    ///
    /// Entries that cannot be enumerated are returned as errors alongside
    /// the valid ones so callers can log and skip them individually.
    fn advertisements(&self, group: &str) -> Vec<Result<Advertisement, CatalogError>>;
}
