//! Discovery of installed tools.
//!
//! [`discover`] walks every advertisement published under an extension-point
//! group, constructs each tool through its factory, and collects the results
//! into a [`ToolSet`] keyed by advertised name. A broken advertisement never
//! aborts discovery: the failure is logged and the entry is skipped.

use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;
use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::CatalogSource;
use crate::contract::Tool;

/// Tracing target for discovery.
const DISCOVERY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::discovery");

/// Mapping from advertised name to a constructed tool instance.
///
/// Iteration is in ascending name order. The set is read-only once built and
/// cheap to clone, so it can be shared across connection threads.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use anvil_tools::{Arguments, ExecutionResult, Tool, ToolError, ToolSet};
///
/// struct Noop;
///
/// impl Tool for Noop {
///     fn name(&self) -> &str {
///         "noop"
///     }
///
///     fn execute(&self, _: &Arguments) -> Result<ExecutionResult, ToolError> {
///         Ok(ExecutionResult::default())
///     }
/// }
///
/// let mut tools = ToolSet::new();
/// assert!(tools.insert("noop", Arc::new(Noop)).is_none());
/// assert!(tools.contains("noop"));
/// assert_eq!(tools.names().collect::<Vec<_>>(), vec!["noop"]);
/// ```
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a tool under `name`, returning the tool it replaced.
    pub fn insert(&mut self, name: impl Into<String>, tool: Arc<dyn Tool>) -> Option<Arc<dyn Tool>> {
        self.tools.insert(name.into(), tool)
    }

    /// Looks up a tool by advertised name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    /// Returns `true` when a tool is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the advertised names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(String::as_str)
    }

    /// Iterates over `(name, tool)` pairs in ascending name order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Arc<dyn Tool>> {
        self.tools.iter()
    }

    /// Returns the number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` when no tools were discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl<'a> IntoIterator for &'a ToolSet {
    type Item = (&'a String, &'a Arc<dyn Tool>);
    type IntoIter = btree_map::Iter<'a, String, Arc<dyn Tool>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.tools.keys()).finish()
    }
}

/// Discovers every tool advertised under `group` across `sources`.
///
/// Sources are visited in order and advertisements within a source in the
/// order the source yields them. When two advertisements share a name, the
/// later one replaces the earlier one and a warning is logged. Advertisements
/// that cannot be enumerated or whose factory fails are logged and skipped;
/// this function never fails.
#[must_use]
pub fn discover(sources: &[&dyn CatalogSource], group: &str) -> ToolSet {
    let mut tools = ToolSet::new();
    for source in sources {
        for entry in source.advertisements(group) {
            let advertisement = match entry {
                Ok(advertisement) => advertisement,
                Err(error) => {
                    warn!(
                        target: DISCOVERY_TARGET,
                        source = source.label(),
                        group,
                        %error,
                        "skipping unreadable tool advertisement"
                    );
                    continue;
                }
            };

            let tool = match advertisement.load() {
                Ok(tool) => tool,
                Err(error) => {
                    warn!(
                        target: DISCOVERY_TARGET,
                        source = source.label(),
                        tool = advertisement.name(),
                        component = advertisement.component(),
                        %error,
                        "failed to load tool"
                    );
                    continue;
                }
            };

            let name = advertisement.name();
            if tools.insert(name, Arc::from(tool)).is_some() {
                warn!(
                    target: DISCOVERY_TARGET,
                    tool = name,
                    component = advertisement.component(),
                    "tool advertised more than once; keeping the later registration"
                );
            }
            info!(
                target: DISCOVERY_TARGET,
                tool = name,
                component = advertisement.component(),
                "registered tool"
            );
        }
    }
    tools
}

#[cfg(test)]
mod tests;
