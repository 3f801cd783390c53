//! Request parsing for the JSONL transport.

use anvil_tools::Arguments;
use serde_json::Value;

use super::RequestError;

/// A parsed request naming the endpoint to call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Caller-chosen identifier echoed in the response; `null` when absent.
    pub id: Value,
    /// Endpoint name.
    pub tool: String,
    /// Keyword arguments; `{}` when absent or `null`.
    pub arguments: Arguments,
}

/// A request line that could not be turned into a [`ToolCall`].
///
/// Carries the request id when one could be read, so the error response can
/// still be correlated.
#[derive(Debug)]
pub struct RejectedRequest {
    /// Identifier recovered from the line, or `null`.
    pub id: Value,
    /// Why the request was rejected.
    pub error: RequestError,
}

impl ToolCall {
    /// Parses one request line.
    ///
    /// # Errors
    ///
    /// Returns a [`RejectedRequest`] when the line is not a JSON object, has
    /// no non-empty `tool` string, or carries non-object `arguments`.
    pub fn parse(line: &[u8]) -> Result<Self, RejectedRequest> {
        let value: Value = serde_json::from_slice(line).map_err(|error| RejectedRequest {
            id: Value::Null,
            error: RequestError::malformed(error.to_string()),
        })?;
        let Value::Object(mut envelope) = value else {
            return Err(RejectedRequest {
                id: Value::Null,
                error: RequestError::malformed("request must be a JSON object"),
            });
        };

        let id = envelope.remove("id").unwrap_or(Value::Null);
        let tool = match envelope.remove("tool") {
            Some(Value::String(name)) if !name.trim().is_empty() => name,
            _ => {
                return Err(RejectedRequest {
                    id,
                    error: RequestError::malformed("tool must be a non-empty string"),
                });
            }
        };
        let arguments = match envelope.remove("arguments") {
            None | Some(Value::Null) => Arguments::new(),
            Some(Value::Object(arguments)) => arguments,
            Some(other) => {
                return Err(RejectedRequest {
                    id,
                    error: RequestError::invalid_arguments(format!(
                        "arguments must be an object, got {}",
                        json_type(&other)
                    )),
                });
            }
        };

        Ok(Self {
            id,
            tool,
            arguments,
        })
    }
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
