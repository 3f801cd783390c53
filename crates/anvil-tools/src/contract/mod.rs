//! The capability contract every tool satisfies.
//!
//! A tool is anything that has a public name and can execute with a set of
//! keyword arguments. No shared base type is required: independently built
//! components implement [`Tool`] for their own types and advertise a
//! [`ToolFactory`](crate::catalog::ToolFactory) through a catalog.
//!
//! Execution has two failure channels. A tool that ran but could not do its
//! job returns an [`ExecutionResult`] with `success == false` and an error
//! message. A tool that could not run at all returns
//! [`ToolError`](crate::ToolError).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ToolError;

/// Keyword arguments passed to [`Tool::execute`].
pub type Arguments = Map<String, Value>;

/// Structured data carried by an [`ExecutionResult`].
pub type ResultData = Map<String, Value>;

/// Outcome of a single tool execution.
///
/// `data` is always present and defaults to an empty mapping. When
/// `success` is false, `error` should carry a message, but this is not
/// enforced.
///
/// # Example
///
/// ```
/// use anvil_tools::ExecutionResult;
/// use serde_json::json;
///
/// let mut data = serde_json::Map::new();
/// data.insert("score".into(), json!(92));
/// let result = ExecutionResult::success(data);
/// assert!(result.success);
/// assert!(result.error.is_none());
///
/// let failed = ExecutionResult::failure("mypy not installed");
/// assert!(!failed.success);
/// assert!(failed.data.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the tool completed its work.
    pub success: bool,
    /// Structured output of the tool.
    #[serde(default)]
    pub data: ResultData,
    /// Failure description, normally present when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Creates a successful result carrying `data`.
    #[must_use]
    pub const fn success(data: ResultData) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    /// Creates a failed result with an error message and no data.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: ResultData::new(),
            error: Some(message.into()),
        }
    }

    /// Replaces the data mapping, keeping the success flag and error.
    #[must_use]
    pub fn with_data(mut self, data: ResultData) -> Self {
        self.data = data;
        self
    }

    /// Returns the error message when it is present and non-empty.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|message| !message.is_empty())
    }
}

/// A callable capability discovered at runtime.
///
/// Implementations must be shareable across connection threads; the
/// discovered tool set is read-only once built, so `execute` takes `&self`.
///
/// # Example
///
/// ```
/// use anvil_tools::{Arguments, ExecutionResult, Tool, ToolError};
///
/// struct Echo;
///
/// impl Tool for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn description(&self) -> Option<&str> {
///         Some("Echo the supplied arguments back.")
///     }
///
///     fn execute(&self, arguments: &Arguments) -> Result<ExecutionResult, ToolError> {
///         Ok(ExecutionResult::success(arguments.clone()))
///     }
/// }
///
/// let result = Echo.execute(&Arguments::new()).unwrap();
/// assert!(result.success);
/// ```
pub trait Tool: Send + Sync {
    /// Name the tool declares for itself.
    ///
    /// Discovery keys tools by their advertised name, which may differ.
    fn name(&self) -> &str;

    /// Documentation for `execute`; the first line is used as a summary.
    ///
    /// Returns `None` for undocumented tools.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Executes the tool with the given keyword arguments.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolError`] when the tool cannot run at all. Failures the
    /// tool can describe are reported through [`ExecutionResult::failure`].
    fn execute(&self, arguments: &Arguments) -> Result<ExecutionResult, ToolError>;
}

/// Returns the first non-empty line of a tool's description.
///
/// Leading and trailing whitespace of the whole description is ignored, so
/// indented multi-line documentation still yields its summary line.
#[must_use]
pub fn summary_line(description: Option<&str>) -> &str {
    description
        .map(str::trim)
        .and_then(|text| text.lines().next())
        .map_or("", str::trim_end)
}
