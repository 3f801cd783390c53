//! Compiled-in registration table.

use std::sync::Arc;

use super::{Advertisement, CatalogSource, ToolFactory};
use crate::contract::Tool;
use crate::error::{CatalogError, ToolError};

/// Catalog backed by a table of factories registered in code.
///
/// # Example
///
/// ```
/// use anvil_tools::{Arguments, CatalogSource, ExecutionResult, StaticCatalog, Tool, ToolError};
///
/// struct Ping;
///
/// impl Tool for Ping {
///     fn name(&self) -> &str {
///         "ping"
///     }
///
///     fn execute(&self, _: &Arguments) -> Result<ExecutionResult, ToolError> {
///         Ok(ExecutionResult::default())
///     }
/// }
///
/// let catalog = StaticCatalog::new("builtin").advertise("anvil.tools", "ping", || {
///     Ok(Box::new(Ping) as Box<dyn Tool>)
/// });
/// assert_eq!(catalog.advertisements("anvil.tools").len(), 1);
/// assert!(catalog.advertisements("other.group").is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct StaticCatalog {
    component: String,
    entries: Vec<(String, Advertisement)>,
}

impl StaticCatalog {
    /// Creates an empty table owned by `component`.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            entries: Vec::new(),
        }
    }

    /// Registers a constructor closure under `group` with the given name.
    #[must_use]
    pub fn advertise<F>(self, group: impl Into<String>, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Result<Box<dyn Tool>, ToolError> + Send + Sync + 'static,
    {
        self.advertise_factory(group, name, factory)
    }

    /// Registers any [`ToolFactory`] under `group` with the given name.
    #[must_use]
    pub fn advertise_factory(
        mut self,
        group: impl Into<String>,
        name: impl Into<String>,
        factory: impl ToolFactory + 'static,
    ) -> Self {
        let advertisement = Advertisement::new(name, self.component.clone(), Arc::new(factory));
        self.entries.push((group.into(), advertisement));
        self
    }

    /// Returns the number of registered entries across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CatalogSource for StaticCatalog {
    fn label(&self) -> &str {
        self.component.as_str()
    }

    fn advertisements(&self, group: &str) -> Vec<Result<Advertisement, CatalogError>> {
        self.entries
            .iter()
            .filter(|(entry_group, _)| entry_group == group)
            .map(|(_, advertisement)| Ok(advertisement.clone()))
            .collect()
    }
}
