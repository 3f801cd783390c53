//! Meta-endpoints published alongside the discovered tools.

use std::collections::BTreeMap;

use anvil_tools::{Arguments, ToolSet, summary_line};
use serde_json::{Value, json};

use super::adapter::unwrap_kwargs;
use super::{Endpoint, EndpointError};
use crate::verify::verify_project;

/// Name of the listing meta-endpoint.
pub const LIST_TOOLS_ENDPOINT: &str = "list_tools";

/// Name of the composite verification endpoint.
pub const VERIFY_ENDPOINT: &str = "verify";

/// Project path used by `verify` when none is supplied.
pub const DEFAULT_VERIFY_PATH: &str = ".";

/// Description of the `verify` endpoint, also used as its listing entry.
pub const VERIFY_DESCRIPTION: &str = "Verify a project in one call: audit, governance check, and impact context for each audit failure.";

/// Static listing entries not backed by a discovered tool, keyed by name.
pub type ExtraTools = BTreeMap<String, String>;

/// Lists the discovered tools, plus any extra entries, sorted by name.
///
/// Each entry's description is the summary line of the tool's own
/// description, or an empty string for undocumented tools. An extra entry
/// replaces a discovered tool of the same name in the listing.
#[derive(Debug, Clone)]
pub struct ListToolsEndpoint {
    tools: ToolSet,
    extra_tools: ExtraTools,
}

impl ListToolsEndpoint {
    /// Creates the listing over `tools` and `extra_tools`.
    #[must_use]
    pub const fn new(tools: ToolSet, extra_tools: ExtraTools) -> Self {
        Self { tools, extra_tools }
    }

    fn entries(&self) -> BTreeMap<&str, &str> {
        let mut entries: BTreeMap<&str, &str> = self
            .tools
            .iter()
            .map(|(name, tool)| (name.as_str(), summary_line(tool.description())))
            .collect();
        for (name, description) in &self.extra_tools {
            entries.insert(name.as_str(), description.as_str());
        }
        entries
    }
}

impl Endpoint for ListToolsEndpoint {
    fn description(&self) -> String {
        String::from("List all available tools with their names and descriptions.")
    }

    fn call(&self, arguments: Arguments) -> Result<Value, EndpointError> {
        let _ignored = unwrap_kwargs(arguments);
        let tools: Vec<Value> = self
            .entries()
            .into_iter()
            .map(|(name, description)| json!({"name": name, "description": description}))
            .collect();
        let count = tools.len();
        Ok(json!({"tools": tools, "count": count}))
    }
}

/// Composite endpoint running [`verify_project`] over the discovered tools.
///
/// Accepts a single optional `path` string argument, defaulting to `"."`.
#[derive(Debug, Clone)]
pub struct VerifyEndpoint {
    tools: ToolSet,
}

impl VerifyEndpoint {
    /// Creates the endpoint over `tools`.
    #[must_use]
    pub const fn new(tools: ToolSet) -> Self {
        Self { tools }
    }
}

impl Endpoint for VerifyEndpoint {
    fn description(&self) -> String {
        VERIFY_DESCRIPTION.to_owned()
    }

    fn call(&self, arguments: Arguments) -> Result<Value, EndpointError> {
        let unwrapped = unwrap_kwargs(arguments);
        let path = match unwrapped.get("path") {
            None | Some(Value::Null) => DEFAULT_VERIFY_PATH,
            Some(Value::String(path)) => path.as_str(),
            Some(other) => {
                return Err(EndpointError::invalid_arguments(
                    VERIFY_ENDPOINT,
                    format!("path must be a string, got {other}"),
                ));
            }
        };
        let report = verify_project(path, &self.tools);
        Ok(serde_json::to_value(report)?)
    }
}
