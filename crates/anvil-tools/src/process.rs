//! Process-backed tools declared by manifests.
//!
//! [`ProcessTool`] implements [`Tool`] by spawning the manifest's executable,
//! writing the request to stdin as a single JSONL line, reading the
//! [`ExecutionResult`] from stdout, and killing the process once the
//! manifest's timeout passes.
//! [`ProcessToolFactory`] is the advertisement factory that resolves the
//! executable on disk before handing out a tool.
//!
//! Child processes are not sandboxed; they run with the broker's privileges.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::catalog::ToolFactory;
use crate::contract::{Arguments, ExecutionResult, Tool};
use crate::error::ToolError;
use crate::manifest::ToolManifest;
use crate::protocol::ToolRequest;

/// Tracing target for tool process operations.
const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Factory that resolves a manifest entry into a [`ProcessTool`].
///
/// # Example
///
/// ```rust,no_run
/// use anvil_tools::process::ProcessToolFactory;
/// use anvil_tools::{ToolFactory, ToolManifest};
/// use std::path::PathBuf;
///
/// let factory = ProcessToolFactory::new(ToolManifest::new(
///     "audit",
///     PathBuf::from("/usr/bin/anvil-audit"),
/// ));
/// // Fails with `ExecutableNotFound` when the binary is not installed.
/// let tool = factory.create();
/// ```
#[derive(Debug, Clone)]
pub struct ProcessToolFactory {
    manifest: ToolManifest,
}

impl ProcessToolFactory {
    /// Creates a factory for the given manifest entry.
    #[must_use]
    pub const fn new(manifest: ToolManifest) -> Self {
        Self { manifest }
    }

    /// Returns the manifest entry backing this factory.
    #[must_use]
    pub const fn manifest(&self) -> &ToolManifest {
        &self.manifest
    }
}

impl ToolFactory for ProcessToolFactory {
    fn create(&self) -> Result<Box<dyn Tool>, ToolError> {
        self.manifest.validate()?;
        let executable = self.manifest.executable();
        if !executable.is_file() {
            return Err(ToolError::ExecutableNotFound {
                name: self.manifest.name().to_owned(),
                path: executable.to_path_buf(),
            });
        }
        Ok(Box::new(ProcessTool::new(self.manifest.clone())))
    }
}

/// Tool that executes an external program once per call.
#[derive(Debug, Clone)]
pub struct ProcessTool {
    manifest: ToolManifest,
}

impl ProcessTool {
    /// Creates a tool for an already validated manifest entry.
    #[must_use]
    pub const fn new(manifest: ToolManifest) -> Self {
        Self { manifest }
    }
}

impl Tool for ProcessTool {
    fn name(&self) -> &str {
        self.manifest.name()
    }

    fn description(&self) -> Option<&str> {
        self.manifest.description()
    }

    fn execute(&self, arguments: &Arguments) -> Result<ExecutionResult, ToolError> {
        let request = ToolRequest::new(self.manifest.name(), arguments.clone());
        execute_process(&self.manifest, &request)
    }
}

/// Interval between exit checks while a tool winds down.
const EXIT_POLL: Duration = Duration::from_millis(20);

/// Lines read from the tool's stdout; `None` marks end of stream.
type StdoutLine = io::Result<Option<String>>;

/// Runs one request through the tool process under a single deadline.
///
/// The deadline covers the response read and the exit wait together. Stdout
/// and stderr are read on helper threads so neither pipe can stall the
/// child, and the child is killed if the call returns before it exits.
fn execute_process(
    manifest: &ToolManifest,
    request: &ToolRequest,
) -> Result<ExecutionResult, ToolError> {
    let name = manifest.name();
    let mut payload = serde_json::to_string(request).map_err(ToolError::SerializeRequest)?;
    payload.push('\n');

    let deadline = Deadline::after(manifest.timeout_secs());
    let mut running = RunningTool::spawn(manifest)?;
    let (stdin, stdout, stderr) = running.take_pipes()?;

    if let Some(pipe) = stderr {
        log_stderr(name, pipe);
    }
    let lines = read_first_line(name, stdout);
    send_request(name, stdin, payload);

    let line = await_line(name, &lines, deadline)?;
    running.wait(deadline)?;
    parse_response(name, &line)
}

fn io_error(name: &str, err: std::io::Error) -> ToolError {
    ToolError::Io {
        name: name.to_owned(),
        source: Arc::new(err),
    }
}

fn capture_failed(name: &str, pipe: &str) -> ToolError {
    ToolError::SpawnFailed {
        name: name.to_owned(),
        message: format!("failed to capture {pipe}"),
        source: None,
    }
}

/// Point in time by which a tool call must have finished.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Option<Instant>,
    timeout_secs: u64,
}

impl Deadline {
    fn after(timeout_secs: u64) -> Self {
        Self {
            at: Instant::now().checked_add(Duration::from_secs(timeout_secs)),
            timeout_secs,
        }
    }

    /// Time left before the deadline, or `None` once it has passed.
    fn remaining(self) -> Option<Duration> {
        let Some(at) = self.at else {
            return Some(Duration::MAX);
        };
        at.checked_duration_since(Instant::now())
            .filter(|left| !left.is_zero())
    }

    fn exceeded(self, name: &str) -> ToolError {
        warn!(
            target: PROCESS_TARGET,
            tool = name,
            timeout_secs = self.timeout_secs,
            "tool timed out, killing process"
        );
        ToolError::Timeout {
            name: name.to_owned(),
            timeout_secs: self.timeout_secs,
        }
    }
}

/// A spawned tool process, killed on drop unless it has been reaped.
struct RunningTool<'a> {
    name: &'a str,
    child: Child,
    reaped: bool,
}

impl<'a> RunningTool<'a> {
    fn spawn(manifest: &'a ToolManifest) -> Result<Self, ToolError> {
        let name = manifest.name();
        debug!(
            target: PROCESS_TARGET,
            tool = name,
            executable = %manifest.executable().display(),
            "spawning tool process"
        );
        let child = Command::new(manifest.executable())
            .args(manifest.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| ToolError::SpawnFailed {
                name: name.to_owned(),
                message: err.to_string(),
                source: Some(Arc::new(err)),
            })?;
        Ok(Self {
            name,
            child,
            reaped: false,
        })
    }

    fn take_pipes(
        &mut self,
    ) -> Result<(ChildStdin, ChildStdout, Option<ChildStderr>), ToolError> {
        let stdin = self
            .child
            .stdin
            .take()
            .ok_or_else(|| capture_failed(self.name, "stdin"))?;
        let stdout = self
            .child
            .stdout
            .take()
            .ok_or_else(|| capture_failed(self.name, "stdout"))?;
        Ok((stdin, stdout, self.child.stderr.take()))
    }

    /// Polls for exit until `deadline`, mapping a failed status to an error.
    fn wait(&mut self, deadline: Deadline) -> Result<(), ToolError> {
        loop {
            let polled = self
                .child
                .try_wait()
                .map_err(|err| io_error(self.name, err))?;
            if let Some(status) = polled {
                self.reaped = true;
                debug!(target: PROCESS_TARGET, tool = self.name, ?status, "tool process exited");
                if status.success() {
                    return Ok(());
                }
                return Err(ToolError::NonZeroExit {
                    name: self.name.to_owned(),
                    status: status.code().unwrap_or(-1),
                });
            }
            let Some(left) = deadline.remaining() else {
                return Err(deadline.exceeded(self.name));
            };
            thread::sleep(left.min(EXIT_POLL));
        }
    }
}

impl Drop for RunningTool<'_> {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        drop(self.child.kill());
        drop(self.child.wait());
    }
}

/// Writes the request line on a helper thread and closes stdin.
///
/// A write failure is only logged: a tool that exits without reading its
/// input is judged by what it printed.
fn send_request(name: &str, mut stdin: ChildStdin, payload: String) {
    let tool = name.to_owned();
    debug!(
        target: PROCESS_TARGET,
        tool = name,
        request_bytes = payload.len(),
        "writing request to tool stdin"
    );
    thread::spawn(move || {
        let written = stdin
            .write_all(payload.as_bytes())
            .and_then(|()| stdin.flush());
        if let Err(error) = written {
            debug!(target: PROCESS_TARGET, tool = %tool, %error, "tool stdin closed early");
        }
    });
}

/// Reads the first stdout line on a helper thread, then drains the rest.
fn read_first_line(name: &str, stdout: ChildStdout) -> Receiver<StdoutLine> {
    let (sender, receiver) = mpsc::channel();
    let tool = name.to_owned();
    thread::spawn(move || {
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let first = match reader.read_line(&mut line) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(line)),
            Err(err) => Err(err),
        };
        drop(sender.send(first));
        if let Err(error) = io::copy(&mut reader, &mut io::sink()) {
            debug!(target: PROCESS_TARGET, tool = %tool, %error, "stopped draining tool stdout");
        }
    });
    receiver
}

/// Collects stderr on a helper thread and logs it once the pipe closes.
fn log_stderr(name: &str, stderr: ChildStderr) {
    let tool = name.to_owned();
    thread::spawn(move || {
        let mut buffer = String::new();
        if BufReader::new(stderr).read_to_string(&mut buffer).is_ok() && !buffer.is_empty() {
            debug!(
                target: PROCESS_TARGET,
                tool = %tool,
                stderr = %buffer.trim(),
                "tool stderr output"
            );
        }
    });
}

/// Waits for the first stdout line until `deadline`.
fn await_line(
    name: &str,
    lines: &Receiver<StdoutLine>,
    deadline: Deadline,
) -> Result<String, ToolError> {
    let Some(left) = deadline.remaining() else {
        return Err(deadline.exceeded(name));
    };
    match lines.recv_timeout(left) {
        Ok(Ok(Some(line))) => Ok(line),
        Ok(Ok(None)) | Err(RecvTimeoutError::Disconnected) => Err(ToolError::InvalidOutput {
            name: name.to_owned(),
            message: String::from("tool produced no output on stdout"),
        }),
        Ok(Err(err)) => Err(io_error(name, err)),
        Err(RecvTimeoutError::Timeout) => Err(deadline.exceeded(name)),
    }
}

/// Parses a JSONL response line into an [`ExecutionResult`].
fn parse_response(name: &str, line: &str) -> Result<ExecutionResult, ToolError> {
    serde_json::from_str(line.trim()).map_err(|err| ToolError::DeserializeResponse {
        message: format!("tool '{name}' produced invalid JSON: {err}"),
        source: Some(err),
    })
}
