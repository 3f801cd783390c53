//! Tests for request parsing, the session loop and the socket listener.

use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::TcpStream;
use std::sync::Arc;

use anvil_config::SocketEndpoint;
use anvil_tools::testing::ScriptedTool;
use anvil_tools::{ExecutionResult, Tool, ToolSet};
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::server::{ExtraTools, ToolServer, register_tools};

fn shared(tool: ScriptedTool) -> Arc<dyn Tool> {
    Arc::new(tool)
}

#[fixture]
fn server() -> ToolServer {
    let mut tools = ToolSet::new();
    tools.insert(
        "echo",
        shared(ScriptedTool::from_fn("echo", |arguments| {
            Ok(ExecutionResult::success(arguments.clone()))
        })),
    );
    tools.insert("broken", shared(ScriptedTool::raising("broken", "exploded")));
    let mut server = ToolServer::new();
    register_tools(&mut server, &tools, &ExtraTools::new());
    server
}

fn run_session(server: &ToolServer, input: &[u8]) -> Vec<Value> {
    let mut output = Vec::new();
    serve_session(server, Cursor::new(input), &mut output).expect("session");
    String::from_utf8(output)
        .expect("utf8 output")
        .lines()
        .map(|line| serde_json::from_str(line).expect("response is JSON"))
        .collect()
}

// ---------------------------------------------------------------------------
// ToolCall::parse
// ---------------------------------------------------------------------------

#[test]
fn parses_full_request() {
    let call = ToolCall::parse(br#"{"id": 7, "tool": "audit", "arguments": {"path": "."}}"#)
        .expect("valid request");
    assert_eq!(call.id, json!(7));
    assert_eq!(call.tool, "audit");
    assert_eq!(Value::Object(call.arguments), json!({"path": "."}));
}

#[rstest]
#[case::missing(br#"{"tool": "audit"}"#.as_slice())]
#[case::null(br#"{"tool": "audit", "arguments": null}"#.as_slice())]
fn absent_arguments_default_to_empty(#[case] line: &[u8]) {
    let call = ToolCall::parse(line).expect("valid request");
    assert_eq!(call.id, Value::Null);
    assert!(call.arguments.is_empty());
}

#[rstest]
#[case::not_json(b"{not json".as_slice(), "malformed-request", Value::Null)]
#[case::not_object(b"[1, 2]".as_slice(), "malformed-request", Value::Null)]
#[case::missing_tool(br#"{"id": "a"}"#.as_slice(), "malformed-request", json!("a"))]
#[case::blank_tool(br#"{"id": "a", "tool": " "}"#.as_slice(), "malformed-request", json!("a"))]
#[case::numeric_tool(br#"{"id": 3, "tool": 3}"#.as_slice(), "malformed-request", json!(3))]
#[case::list_arguments(
    br#"{"id": 4, "tool": "audit", "arguments": [1]}"#.as_slice(),
    "invalid-arguments",
    json!(4)
)]
fn rejects_bad_requests(#[case] line: &[u8], #[case] kind: &str, #[case] id: Value) {
    let rejected = ToolCall::parse(line).expect_err("request should be rejected");
    assert_eq!(rejected.error.kind(), kind);
    assert_eq!(rejected.id, id);
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[test]
fn success_response_shape() {
    let response = Response::success(json!(1), json!({"success": true}));
    assert_eq!(
        serde_json::to_value(&response).expect("serialise"),
        json!({"id": 1, "result": {"success": true}})
    );
}

#[test]
fn failure_response_shape() {
    let response = Response::failure(json!("x"), &RequestError::malformed("bad"));
    assert_eq!(
        serde_json::to_value(&response).expect("serialise"),
        json!({"id": "x", "error": {"kind": "malformed-request", "message": "malformed request: bad"}})
    );
}

#[test]
fn writer_frames_lines() {
    let mut output = Vec::new();
    let mut writer = ResponseWriter::new(&mut output);
    writer
        .write(&Response::success(Value::Null, json!({})))
        .expect("write response");
    assert_eq!(output, b"{\"id\":null,\"result\":{}}\n");
}

// ---------------------------------------------------------------------------
// serve_session
// ---------------------------------------------------------------------------

#[rstest]
fn session_answers_each_line_in_order(server: ToolServer) {
    let input = concat!(
        "{\"id\":1,\"tool\":\"echo\",\"arguments\":{\"kwargs\":{\"x\":1}}}\n",
        "\n",
        "   \n",
        "{\"id\":2,\"tool\":\"missing\"}\n",
        "garbage\n",
        "{\"id\":3,\"tool\":\"broken\"}\n",
        "{\"id\":4,\"tool\":\"list_tools\"}",
    );

    let responses = run_session(&server, input.as_bytes());

    assert_eq!(responses.len(), 5);
    assert_eq!(
        responses.first(),
        Some(&json!({"id": 1, "result": {"success": true, "x": 1}}))
    );
    let kinds: Vec<Option<&str>> = responses
        .iter()
        .map(|response| response.pointer("/error/kind").and_then(Value::as_str))
        .collect();
    assert_eq!(
        kinds,
        vec![
            None,
            Some("unknown-endpoint"),
            Some("malformed-request"),
            Some("tool-failed"),
            None
        ]
    );
    assert_eq!(responses.get(3).and_then(|r| r.get("id")), Some(&json!(3)));
    assert_eq!(
        responses.get(4).and_then(|r| r.pointer("/result/count")),
        Some(&json!(2))
    );
}

#[rstest]
fn oversized_request_is_rejected_and_session_continues(server: ToolServer) {
    let mut input = vec![b' '; MAX_REQUEST_BYTES + 10];
    input.push(b'\n');
    input.extend_from_slice(b"{\"id\":9,\"tool\":\"echo\"}\n");

    let responses = run_session(&server, &input);

    assert_eq!(responses.len(), 2);
    assert_eq!(
        responses.first().and_then(|r| r.pointer("/error/kind")),
        Some(&json!("request-too-large"))
    );
    assert_eq!(
        responses.get(1),
        Some(&json!({"id": 9, "result": {"success": true}}))
    );
}

#[rstest]
fn empty_input_produces_no_output(server: ToolServer) {
    assert!(run_session(&server, b"").is_empty());
}

// ---------------------------------------------------------------------------
// SocketListener
// ---------------------------------------------------------------------------

fn exchange(stream: &mut (impl Write + std::io::Read), request: &str) -> Value {
    stream
        .write_all(format!("{request}\n").as_bytes())
        .expect("write request");
    let mut line = String::new();
    BufReader::new(stream)
        .read_line(&mut line)
        .expect("read response");
    serde_json::from_str(&line).expect("response is JSON")
}

#[rstest]
fn tcp_listener_serves_sessions(server: ToolServer) {
    let listener =
        SocketListener::bind(&SocketEndpoint::tcp("127.0.0.1", 0)).expect("bind tcp listener");
    let addr = listener.local_addr().expect("tcp address");
    let handle = listener
        .start(Arc::new(ToolConnectionHandler::new(Arc::new(server))))
        .expect("start listener");

    let mut first = TcpStream::connect(addr).expect("connect first client");
    let mut second = TcpStream::connect(addr).expect("connect second client");
    let first_reply = exchange(&mut first, r#"{"id":"a","tool":"echo","arguments":{"n":1}}"#);
    let second_reply = exchange(&mut second, r#"{"id":"b","tool":"list_tools"}"#);

    assert_eq!(first_reply, json!({"id": "a", "result": {"success": true, "n": 1}}));
    assert_eq!(second_reply.pointer("/result/count"), Some(&json!(2)));
    handle.shutdown();
    handle.join().expect("join listener");
}

#[cfg(unix)]
mod unix {
    use std::os::unix::net::{UnixListener, UnixStream};

    use super::*;

    fn endpoint_in(dir: &tempfile::TempDir) -> (std::path::PathBuf, SocketEndpoint) {
        let path = dir.path().join("anvild.sock");
        let endpoint = SocketEndpoint::unix(path.to_str().expect("utf8 path"));
        (path, endpoint)
    }

    #[rstest]
    fn replaces_stale_socket_and_cleans_up(server: ToolServer) {
        let dir = tempfile::tempdir().expect("temp dir");
        let (path, endpoint) = endpoint_in(&dir);
        {
            let _stale = UnixListener::bind(&path).expect("bind stale listener");
        }
        assert!(path.exists(), "stale socket should remain");

        let listener = SocketListener::bind(&endpoint).expect("bind new listener");
        let handle = listener
            .start(Arc::new(ToolConnectionHandler::new(Arc::new(server))))
            .expect("start listener");
        let mut client = UnixStream::connect(&path).expect("connect unix client");
        let reply = exchange(&mut client, r#"{"id":1,"tool":"echo"}"#);

        assert_eq!(reply, json!({"id": 1, "result": {"success": true}}));
        handle.shutdown();
        handle.join().expect("join listener");
        assert!(!path.exists(), "listener should remove its socket on shutdown");
    }

    #[test]
    fn rejects_socket_in_use() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (path, endpoint) = endpoint_in(&dir);
        let _existing = UnixListener::bind(&path).expect("bind existing listener");

        let error = SocketListener::bind(&endpoint).expect_err("bind should fail");

        assert!(matches!(error, ListenerError::UnixInUse { .. }));
    }

    #[test]
    fn rejects_regular_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let (path, endpoint) = endpoint_in(&dir);
        std::fs::write(&path, b"not a socket").expect("write file");

        let error = SocketListener::bind(&endpoint).expect_err("bind should fail");

        assert!(matches!(error, ListenerError::UnixNotSocket { .. }));
    }
}
