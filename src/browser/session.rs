use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::browser::page::{
    NetworkResponse, PageError, RenderedPage, ResponseListener, WaitCondition,
};

/// Extra time granted on top of a command's own timeout before the reply is
/// considered lost.
const REPLY_GRACE: Duration = Duration::from_secs(5);

/// How to start the Node.js page server.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub node: String,
    pub server_script: String,
    pub command_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            node: "node".to_string(),
            server_script: "node/page_server.js".to_string(),
            command_timeout: Duration::from_secs(45),
        }
    }
}

/// Request sent to the page server over stdin (one JSON line).
#[derive(Debug, Serialize)]
#[serde(tag = "cmd", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BrowserRequest {
    Navigate {
        url: String,
        wait_until: WaitCondition,
        timeout_ms: u64,
    },
    Evaluate {
        script: String,
    },
    Screenshot {
        full_page: bool,
    },
    Wait {
        duration_ms: u64,
    },
    Quit,
}

impl BrowserRequest {
    pub fn navigate(url: &str, wait: WaitCondition, timeout: Duration) -> Self {
        BrowserRequest::Navigate {
            url: url.to_string(),
            wait_until: wait,
            timeout_ms: timeout.as_millis() as u64,
        }
    }

    pub fn evaluate(script: &str) -> Self {
        BrowserRequest::Evaluate {
            script: script.to_string(),
        }
    }

    pub fn screenshot(full_page: bool) -> Self {
        BrowserRequest::Screenshot { full_page }
    }

    pub fn wait(duration: Duration) -> Self {
        BrowserRequest::Wait {
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn quit() -> Self {
        BrowserRequest::Quit
    }

    pub fn name(&self) -> &'static str {
        match self {
            BrowserRequest::Navigate { .. } => "navigate",
            BrowserRequest::Evaluate { .. } => "evaluate",
            BrowserRequest::Screenshot { .. } => "screenshot",
            BrowserRequest::Wait { .. } => "wait",
            BrowserRequest::Quit => "quit",
        }
    }
}

/// A request line: the command plus the id its reply will echo.
#[derive(Debug, Serialize)]
pub struct RequestEnvelope<'a> {
    pub id: u64,
    #[serde(flatten)]
    pub request: &'a BrowserRequest,
}

/// Reply received from the page server over stdout (one JSON line).
#[derive(Debug, Deserialize)]
pub struct BrowserResponse {
    #[serde(default)]
    pub id: Option<u64>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub ready: Option<bool>,
}

/// One stdout line from the page server: either a reply or a network event.
#[derive(Debug)]
pub enum ServerLine {
    Reply(BrowserResponse),
    Response(NetworkResponse),
}

impl ServerLine {
    pub fn parse(line: &str) -> Result<Self, PageError> {
        let value: Value = serde_json::from_str(line).map_err(|e| PageError::Json {
            context: "page server line".into(),
            source: e,
        })?;

        let is_response_event = value.get("event").and_then(Value::as_str) == Some("response");
        if is_response_event {
            serde_json::from_value(value)
                .map(ServerLine::Response)
                .map_err(|e| PageError::Json {
                    context: "page server response event".into(),
                    source: e,
                })
        } else {
            serde_json::from_value(value)
                .map(ServerLine::Reply)
                .map_err(|e| PageError::Json {
                    context: "page server reply".into(),
                    source: e,
                })
        }
    }
}

/// A persistent browser page backed by a Node.js page server.
///
/// The server keeps one isolated browser context open. Commands go out as
/// NDJSON over stdin; a reader thread consumes stdout, hands replies back over
/// a channel and dispatches `{"event":"response"}` lines to the registered
/// listeners as they arrive.
pub struct BrowserSession {
    child: Child,
    stdin: ChildStdin,
    replies: Receiver<Result<BrowserResponse, PageError>>,
    listeners: Arc<Mutex<Vec<ResponseListener>>>,
    reader: Option<JoinHandle<()>>,
    command_timeout: Duration,
    next_id: u64,
    closed: bool,
}

impl BrowserSession {
    /// Launch a new session by spawning the page server.
    pub fn launch(config: &SessionConfig) -> Result<Self, PageError> {
        let mut child = Command::new(&config.node)
            .arg(&config.server_script)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| PageError::Spawn {
                script: config.server_script.clone(),
                source: e,
            })?;

        let stdin = child.stdin.take().ok_or_else(|| {
            PageError::SessionIo("Failed to capture stdin of the page server".into())
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            PageError::SessionIo("Failed to capture stdout of the page server".into())
        })?;

        let listeners: Arc<Mutex<Vec<ResponseListener>>> = Arc::new(Mutex::new(Vec::new()));
        let (tx, replies) = mpsc::channel();
        let reader = spawn_reader(stdout, tx, Arc::clone(&listeners));

        let mut session = BrowserSession {
            child,
            stdin,
            replies,
            listeners,
            reader: Some(reader),
            command_timeout: config.command_timeout,
            next_id: 1,
            closed: false,
        };

        // Wait for the ready signal
        let ready = session.receive("launch", session.command_timeout)?;
        if !ready.ok || ready.ready != Some(true) {
            return Err(PageError::Protocol {
                command: "launch".into(),
                error: "Did not receive ready signal from the page server".into(),
            });
        }

        Ok(session)
    }

    /// Send a request and wait up to `timeout` for its reply.
    fn send(
        &mut self,
        request: &BrowserRequest,
        timeout: Duration,
    ) -> Result<BrowserResponse, PageError> {
        if self.closed {
            return Err(PageError::Closed);
        }

        let id = self.next_id;
        self.next_id += 1;

        let json = serde_json::to_string(&RequestEnvelope { id, request }).map_err(|e| {
            PageError::Json {
                context: "BrowserRequest".into(),
                source: e,
            }
        })?;

        writeln!(self.stdin, "{}", json).map_err(|e| {
            PageError::SessionIo(format!("Failed to write to the page server: {}", e))
        })?;
        self.stdin.flush().map_err(|e| {
            PageError::SessionIo(format!("Failed to flush the page server stdin: {}", e))
        })?;

        loop {
            let response = self.receive(request.name(), timeout)?;
            match response.id {
                Some(reply_id) if reply_id != id => {
                    debug!(reply_id, expected = id, "discarding stale page server reply");
                }
                _ => return Ok(response),
            }
        }
    }

    fn receive(&self, command: &str, timeout: Duration) -> Result<BrowserResponse, PageError> {
        match self.replies.recv_timeout(timeout) {
            Ok(reply) => reply,
            Err(RecvTimeoutError::Timeout) => Err(PageError::Timeout {
                command: command.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(PageError::SessionIo(
                "Page server closed its output (process may have died)".into(),
            )),
        }
    }

    /// Send a request and verify it succeeded.
    fn send_ok(
        &mut self,
        request: &BrowserRequest,
        timeout: Duration,
    ) -> Result<BrowserResponse, PageError> {
        let response = self.send(request, timeout)?;
        if !response.ok {
            return Err(PageError::Protocol {
                command: request.name().into(),
                error: response.error.unwrap_or_else(|| "Unknown error".into()),
            });
        }
        Ok(response)
    }
}

fn spawn_reader(
    stdout: ChildStdout,
    replies: Sender<Result<BrowserResponse, PageError>>,
    listeners: Arc<Mutex<Vec<ResponseListener>>>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let reader = BufReader::new(stdout);
        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    let _ = replies.send(Err(PageError::SessionIo(format!(
                        "Failed to read from the page server: {}",
                        e
                    ))));
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            match ServerLine::parse(line.trim()) {
                Ok(ServerLine::Response(response)) => match listeners.lock() {
                    Ok(listeners) => listeners.iter().for_each(|listener| listener(&response)),
                    Err(e) => warn!("response listeners lock poisoned: {}", e),
                },
                Ok(ServerLine::Reply(reply)) => {
                    if replies.send(Ok(reply)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    if replies.send(Err(e)).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

impl RenderedPage for BrowserSession {
    fn navigate(
        &mut self,
        url: &str,
        wait: WaitCondition,
        timeout: Duration,
    ) -> Result<(), PageError> {
        let request = BrowserRequest::navigate(url, wait, timeout);
        match self.send(&request, timeout + REPLY_GRACE)? {
            response if response.ok => Ok(()),
            response => Err(PageError::Navigation(
                response.error.unwrap_or_else(|| "Navigation failed".into()),
            )),
        }
    }

    fn evaluate(&mut self, script: &str) -> Result<Value, PageError> {
        let request = BrowserRequest::evaluate(script);
        let response = self.send(&request, self.command_timeout)?;
        if !response.ok {
            return Err(PageError::Script(
                response.error.unwrap_or_else(|| "Unknown error".into()),
            ));
        }
        Ok(response.data.unwrap_or(Value::Null))
    }

    fn screenshot(&mut self, full_page: bool) -> Result<Vec<u8>, PageError> {
        let request = BrowserRequest::screenshot(full_page);
        let response = self.send_ok(&request, self.command_timeout)?;
        let encoded = response
            .data
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| PageError::Protocol {
                command: "screenshot".into(),
                error: "No image data in screenshot response".into(),
            })?;
        STANDARD.decode(encoded).map_err(|e| PageError::Protocol {
            command: "screenshot".into(),
            error: format!("Invalid base64 image data: {}", e),
        })
    }

    fn wait_for_timeout(&mut self, duration: Duration) -> Result<(), PageError> {
        let request = BrowserRequest::wait(duration);
        self.send_ok(&request, duration + REPLY_GRACE)?;
        Ok(())
    }

    fn on_response(&mut self, listener: ResponseListener) {
        match self.listeners.lock() {
            Ok(mut listeners) => listeners.push(listener),
            Err(e) => warn!("response listeners lock poisoned: {}", e),
        }
    }

    fn close(&mut self) -> Result<(), PageError> {
        if self.closed {
            return Ok(());
        }
        let quit = self.send(&BrowserRequest::quit(), self.command_timeout);
        self.closed = true;
        if quit.is_err() {
            let _ = self.child.kill();
        }

        let waited = self.child.wait();
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }

        quit?;
        waited.map_err(|e| PageError::SessionIo(format!("Failed to reap the page server: {}", e)))?;
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if !self.closed {
            // Best-effort cleanup
            if self.close().is_err() {
                let _ = self.child.kill();
            }
        }
    }
}
