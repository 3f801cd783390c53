//! Per-tool endpoint adapter.
//!
//! Every discovered tool is published through a [`ToolEndpoint`] that unwraps
//! nested keyword arguments, forwards them to [`Tool::execute`], and flattens
//! the [`ExecutionResult`] into a single response object.

use std::sync::Arc;

use anvil_tools::{Arguments, ExecutionResult, ResultData, Tool};
use serde_json::Value;

use super::{Endpoint, EndpointError};

/// Argument name some callers use to nest the real keyword arguments.
pub const KWARGS_KEY: &str = "kwargs";

/// Unwraps `{"kwargs": {...}}` into the inner mapping.
///
/// Only applies when `kwargs` is the sole argument and its value is an
/// object; any other shape is returned unchanged.
///
/// # Example
///
/// ```
/// use anvild::server::unwrap_kwargs;
/// use serde_json::json;
///
/// let nested = json!({"kwargs": {"path": "."}});
/// let flat = unwrap_kwargs(nested.as_object().cloned().unwrap());
/// assert_eq!(flat.get("path"), Some(&json!(".")));
/// ```
#[must_use]
pub fn unwrap_kwargs(mut arguments: Arguments) -> Arguments {
    if arguments.len() != 1 {
        return arguments;
    }
    match arguments.remove(KWARGS_KEY) {
        Some(Value::Object(inner)) => inner,
        Some(other) => {
            arguments.insert(KWARGS_KEY.to_owned(), other);
            arguments
        }
        None => arguments,
    }
}

/// Flattens an execution result into the wire response object.
///
/// The output starts with `success`, then every data member is copied to
/// the top level, then `error` is added when it is present and non-empty.
/// Data members named `success` or `error` therefore collide with the
/// envelope; tools should avoid them.
#[must_use]
pub fn normalize(result: ExecutionResult) -> ResultData {
    let mut output = ResultData::new();
    output.insert("success".to_owned(), Value::Bool(result.success));
    output.extend(result.data);
    if let Some(error) = result.error.filter(|message| !message.is_empty()) {
        output.insert("error".to_owned(), Value::String(error));
    }
    output
}

/// Endpoint backed by a single discovered tool.
#[derive(Clone)]
pub struct ToolEndpoint {
    name: String,
    tool: Arc<dyn Tool>,
}

impl ToolEndpoint {
    /// Wraps `tool` for publication under `name`.
    #[must_use]
    pub fn new(name: impl Into<String>, tool: Arc<dyn Tool>) -> Self {
        Self {
            name: name.into(),
            tool,
        }
    }

    /// Returns the name the endpoint is published under.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }
}

impl Endpoint for ToolEndpoint {
    fn description(&self) -> String {
        match self.tool.description() {
            Some(text) if !text.trim().is_empty() => text.to_owned(),
            _ => format!("Execute {} tool.", self.name),
        }
    }

    fn call(&self, arguments: Arguments) -> Result<Value, EndpointError> {
        let forwarded = unwrap_kwargs(arguments);
        let result = self.tool.execute(&forwarded)?;
        Ok(Value::Object(normalize(result)))
    }
}

impl std::fmt::Debug for ToolEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolEndpoint")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
