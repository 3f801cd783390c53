//! The request/response loop shared by every transport.

use std::io::{self, BufRead, Write};

use serde_json::Value;
use tracing::{debug, info, warn};

use super::{
    RequestError, Response, ResponseWriter, TRANSPORT_TARGET, ToolCall, TransportError,
};
use crate::server::ToolServer;

/// Maximum size of a single request line in bytes, newline included.
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024;

/// Serves requests read from `reader` until it reaches end of input.
///
/// Each line is answered before the next is read. Blank lines are skipped.
/// Malformed, oversized and failing requests are answered with an error
/// response and the loop continues.
///
/// # Errors
///
/// Returns a [`TransportError`] when reading or writing the streams fails.
pub fn serve_session<R, W>(
    server: &ToolServer,
    mut reader: R,
    writer: W,
) -> Result<(), TransportError>
where
    R: BufRead,
    W: Write,
{
    let mut responses = ResponseWriter::new(writer);
    loop {
        let response = match read_bounded_line(&mut reader, MAX_REQUEST_BYTES)? {
            RequestLine::End => return Ok(()),
            RequestLine::TooLarge => {
                warn!(
                    target: TRANSPORT_TARGET,
                    limit = MAX_REQUEST_BYTES,
                    "request exceeds size limit"
                );
                Response::failure(
                    Value::Null,
                    &RequestError::TooLarge {
                        limit: MAX_REQUEST_BYTES,
                    },
                )
            }
            RequestLine::Complete(line) if line.trim_ascii().is_empty() => continue,
            RequestLine::Complete(line) => handle_line(server, &line),
        };
        responses.write(&response)?;
    }
}

/// Serves a single session over the process's standard input and output.
///
/// # Errors
///
/// Returns a [`TransportError`] when standard I/O fails.
pub fn serve_stdio(server: &ToolServer) -> Result<(), TransportError> {
    info!(target: TRANSPORT_TARGET, "serving on standard I/O");
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve_session(server, stdin.lock(), stdout.lock())
}

fn handle_line(server: &ToolServer, line: &[u8]) -> Response {
    let call = match ToolCall::parse(line) {
        Ok(call) => call,
        Err(rejected) => {
            warn!(
                target: TRANSPORT_TARGET,
                kind = rejected.error.kind(),
                error = %rejected.error,
                "rejected request"
            );
            return Response::failure(rejected.id, &rejected.error);
        }
    };

    let ToolCall {
        id,
        tool,
        arguments,
    } = call;
    debug!(target: TRANSPORT_TARGET, tool = %tool, "dispatching request");
    match server.call(&tool, arguments) {
        Ok(result) => Response::success(id, result),
        Err(error) => {
            warn!(
                target: TRANSPORT_TARGET,
                tool = %tool,
                kind = error.kind(),
                error = %error,
                "request failed"
            );
            Response::failure(id, &RequestError::from(error))
        }
    }
}

/// Outcome of reading one request line.
#[derive(Debug, PartialEq, Eq)]
enum RequestLine {
    /// A full line, including its newline when one was read.
    Complete(Vec<u8>),
    /// The line exceeded the limit; its bytes were discarded.
    TooLarge,
    /// No more input.
    End,
}

/// Reads one line of at most `limit` bytes.
///
/// An oversized line is consumed up to and including its newline so the
/// next read starts on a fresh request.
fn read_bounded_line<R: BufRead>(reader: &mut R, limit: usize) -> io::Result<RequestLine> {
    let mut line = Vec::new();
    let mut oversized = false;
    loop {
        let (consumed, finished) = {
            let available = match reader.fill_buf() {
                Ok(available) => available,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => return Err(error),
            };
            if available.is_empty() {
                return Ok(if oversized {
                    RequestLine::TooLarge
                } else if line.is_empty() {
                    RequestLine::End
                } else {
                    RequestLine::Complete(line)
                });
            }

            let newline = available.iter().position(|byte| *byte == b'\n');
            let consumed = newline.map_or(available.len(), |position| position + 1);
            let chunk = available.get(..consumed).unwrap_or_default();
            if !oversized {
                if line.len() + chunk.len() > limit {
                    oversized = true;
                    line = Vec::new();
                } else {
                    line.extend_from_slice(chunk);
                }
            }
            (consumed, newline.is_some())
        };
        reader.consume(consumed);

        if finished {
            return Ok(if oversized {
                RequestLine::TooLarge
            } else {
                RequestLine::Complete(line)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::single(b"abc\n".as_slice(), vec![RequestLine::Complete(b"abc\n".to_vec()), RequestLine::End])]
    #[case::unterminated(b"abc".as_slice(), vec![RequestLine::Complete(b"abc".to_vec()), RequestLine::End])]
    #[case::oversized_then_small(
        b"0123456789\nok\n".as_slice(),
        vec![RequestLine::TooLarge, RequestLine::Complete(b"ok\n".to_vec()), RequestLine::End]
    )]
    #[case::oversized_at_end(b"0123456789".as_slice(), vec![RequestLine::TooLarge, RequestLine::End])]
    #[case::exactly_at_limit(b"1234567\n".as_slice(), vec![RequestLine::Complete(b"1234567\n".to_vec()), RequestLine::End])]
    #[case::empty(b"".as_slice(), vec![RequestLine::End])]
    fn reads_bounded_lines(#[case] input: &[u8], #[case] expected: Vec<RequestLine>) {
        // A tiny buffer forces lines to span several fills.
        let mut reader = io::BufReader::with_capacity(3, Cursor::new(input));
        let lines: Vec<RequestLine> = (0..expected.len())
            .map(|_| read_bounded_line(&mut reader, 8).expect("read line"))
            .collect();
        assert_eq!(lines, expected);
    }
}
