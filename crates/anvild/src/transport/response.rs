//! Response framing for the JSONL transport.

use std::io::Write;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{RequestError, TransportError};

/// One response line.
///
/// Serialises as `{"id": .., "result": ..}` or
/// `{"id": .., "error": {"kind": .., "message": ..}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Identifier echoed from the request.
    pub id: Value,
    /// Outcome of the call.
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Result or error carried by a [`Response`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The endpoint's output.
    Result(Value),
    /// Why the call failed.
    Error(ErrorBody),
}

/// Error object reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable kebab-case kind.
    pub kind: String,
    /// Human-readable description.
    pub message: String,
}

impl Response {
    /// Creates a success response.
    #[must_use]
    pub const fn success(id: Value, result: Value) -> Self {
        Self {
            id,
            outcome: Outcome::Result(result),
        }
    }

    /// Creates an error response describing `error`.
    #[must_use]
    pub fn failure(id: Value, error: &RequestError) -> Self {
        Self {
            id,
            outcome: Outcome::Error(ErrorBody {
                kind: error.kind().to_owned(),
                message: error.to_string(),
            }),
        }
    }
}

/// Writes responses as JSONL, flushing after each line.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Wraps an output stream.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes `response` followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation, writing, or flushing fails.
    pub fn write(&mut self, response: &Response) -> Result<(), TransportError> {
        serde_json::to_writer(&mut self.writer, response)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
