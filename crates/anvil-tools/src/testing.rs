//! Scriptable tool doubles for tests in this and downstream crates.
//!
//! Enabled for unit tests and, in other crates, through the `test-support`
//! feature.

use std::fmt;
use std::sync::{Mutex, PoisonError};

use crate::contract::{Arguments, ExecutionResult, ResultData, Tool};
use crate::error::ToolError;

type Handler = Box<dyn Fn(&Arguments) -> Result<ExecutionResult, ToolError> + Send + Sync>;

/// Tool whose behaviour is supplied by a closure and which records every
/// argument mapping it receives.
///
/// # Example
///
/// ```
/// use anvil_tools::testing::ScriptedTool;
/// use anvil_tools::{Arguments, Tool};
///
/// let tool = ScriptedTool::succeeding("audit", serde_json::Map::new());
/// assert!(tool.execute(&Arguments::new()).unwrap().success);
/// assert_eq!(tool.calls().len(), 1);
/// ```
pub struct ScriptedTool {
    name: String,
    description: Option<String>,
    handler: Handler,
    calls: Mutex<Vec<Arguments>>,
}

impl ScriptedTool {
    /// Creates a tool that delegates to `handler`.
    #[must_use]
    pub fn from_fn<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Arguments) -> Result<ExecutionResult, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: None,
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Creates a tool that always returns `result`.
    #[must_use]
    pub fn returning(name: impl Into<String>, result: ExecutionResult) -> Self {
        Self::from_fn(name, move |_| Ok(result.clone()))
    }

    /// Creates a tool that always succeeds with `data`.
    #[must_use]
    pub fn succeeding(name: impl Into<String>, data: ResultData) -> Self {
        Self::returning(name, ExecutionResult::success(data))
    }

    /// Creates a tool that always reports a failed result with `message`.
    #[must_use]
    pub fn reporting_failure(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::returning(name, ExecutionResult::failure(message))
    }

    /// Creates a tool whose execution always raises an execution error.
    #[must_use]
    pub fn raising(name: impl Into<String>, message: impl Into<String>) -> Self {
        let tool_name: String = name.into();
        let text: String = message.into();
        let reported = tool_name.clone();
        Self::from_fn(tool_name, move |_| {
            Err(ToolError::execution(reported.clone(), text.clone()))
        })
    }

    /// Sets the description reported by [`Tool::description`].
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns a copy of every argument mapping received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Arguments> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Tool for ScriptedTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn execute(&self, arguments: &Arguments) -> Result<ExecutionResult, ToolError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(arguments.clone());
        (self.handler)(arguments)
    }
}

impl fmt::Debug for ScriptedTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}
