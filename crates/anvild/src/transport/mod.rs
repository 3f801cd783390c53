//! JSONL transport for the tool server.
//!
//! Requests and responses are single JSON objects terminated by a newline.
//! A session reads requests from one stream and answers on another until the
//! input ends; the same loop serves standard I/O and every accepted socket
//! connection.
//!
//! ```json
//! {"id":1,"tool":"audit","arguments":{"path":"."}}
//! {"id":1,"result":{"success":true,"score":92}}
//! {"id":2,"error":{"kind":"unknown-endpoint","message":"unknown endpoint: lint"}}
//! ```

mod errors;
mod handler;
mod listener;
mod request;
mod response;
mod session;

#[cfg(test)]
mod tests;

pub use self::errors::{ListenerError, RequestError, TransportError};
pub use self::request::{RejectedRequest, ToolCall};
pub use self::response::{ErrorBody, Outcome, Response, ResponseWriter};
pub use self::session::{MAX_REQUEST_BYTES, serve_session, serve_stdio};

pub(crate) use self::handler::{ConnectionHandler, ConnectionStream, ToolConnectionHandler};
pub(crate) use self::listener::SocketListener;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
