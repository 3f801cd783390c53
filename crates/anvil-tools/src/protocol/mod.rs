//! IPC protocol types for broker-tool communication.
//!
//! The protocol is a single-line JSONL exchange over stdio. The broker writes
//! one [`ToolRequest`] line to the tool's stdin and closes it. The tool
//! writes one [`ExecutionResult`](crate::ExecutionResult) line to stdout and
//! exits. Tool stderr is captured for diagnostic logging but is not part of
//! the protocol.

use serde::{Deserialize, Serialize};

use crate::contract::Arguments;

/// Request sent from the broker to an executable tool on stdin.
///
/// Serialised as a single JSONL line terminated by a newline character.
///
/// # Example
///
/// ```
/// use anvil_tools::protocol::ToolRequest;
/// use anvil_tools::Arguments;
/// use serde_json::json;
///
/// let mut arguments = Arguments::new();
/// arguments.insert("path".into(), json!("."));
/// let request = ToolRequest::new("audit", arguments);
///
/// let line = serde_json::to_string(&request).unwrap();
/// assert_eq!(line, r#"{"tool":"audit","arguments":{"path":"."}}"#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolRequest {
    tool: String,
    #[serde(default)]
    arguments: Arguments,
}

impl ToolRequest {
    /// Creates a request for the named tool.
    #[must_use]
    pub fn new(tool: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            tool: tool.into(),
            arguments,
        }
    }

    /// Returns the advertised tool name.
    #[must_use]
    pub const fn tool(&self) -> &str {
        self.tool.as_str()
    }

    /// Returns the keyword arguments.
    #[must_use]
    pub const fn arguments(&self) -> &Arguments {
        &self.arguments
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::contract::ExecutionResult;

    #[test]
    fn request_defaults_missing_arguments() {
        let request: ToolRequest = serde_json::from_str(r#"{"tool":"audit"}"#).expect("parse");
        assert_eq!(request.tool(), "audit");
        assert!(request.arguments().is_empty());
    }

    #[test]
    fn response_line_parses_into_execution_result() {
        let line = r#"{"success":true,"data":{"callers":[{"file":"cli.py"}],"score":0.7}}"#;
        let result: ExecutionResult = serde_json::from_str(line).expect("parse");
        assert!(result.success);
        assert_eq!(result.data.get("score"), Some(&json!(0.7)));
    }
}
