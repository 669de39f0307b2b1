use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dom::script;
use crate::dom::snapshot::DomSnapshot;

// ============================================================================
// Rendered-page capability
// ============================================================================

/// How long `navigate` waits before considering a navigation complete.
///
/// Serialized with the strings browser drivers use, so the same value doubles
/// as the `waitFor` hint attached to generated flow steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WaitCondition {
    #[serde(rename = "networkidle")]
    NetworkIdle,
    #[serde(rename = "domcontentloaded")]
    DomContentLoaded,
    #[serde(rename = "load")]
    Load,
}

impl WaitCondition {
    /// Strongest first. Navigation falls back along this order.
    pub const FALLBACK_ORDER: [WaitCondition; 3] = [
        WaitCondition::NetworkIdle,
        WaitCondition::DomContentLoaded,
        WaitCondition::Load,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WaitCondition::NetworkIdle => "networkidle",
            WaitCondition::DomContentLoaded => "domcontentloaded",
            WaitCondition::Load => "load",
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A network response observed by the page, as reported by the driver.
///
/// Bodies are raw text; turning them into JSON is the recorder's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkResponse {
    pub url: String,
    pub method: String,
    pub status: u16,
    #[serde(default)]
    pub resource_type: String,
    #[serde(default)]
    pub request_body: Option<String>,
    #[serde(default)]
    pub response_body: Option<String>,
}

/// Callback invoked for every network response, possibly from another thread.
pub type ResponseListener = Box<dyn Fn(&NetworkResponse) + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Timeout {timeout_ms}ms exceeded while waiting for {command}")]
    Timeout { command: String, timeout_ms: u64 },

    #[error("{0}")]
    Navigation(String),

    #[error("Browser command '{command}' failed: {error}")]
    Protocol { command: String, error: String },

    #[error("Browser session I/O error: {0}")]
    SessionIo(String),

    #[error("Failed to spawn {script} (is Node.js installed?): {source}")]
    Spawn {
        script: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error ({context}): {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Page is closed")]
    Closed,
}

/// The browser capability the analysis core consumes.
///
/// Implementations marshal DOM work into whatever the driver offers; the core
/// never assumes shared memory with the page. Everything beyond `evaluate`
/// has a default built on top of it, so a minimal driver only has to ship
/// scripts across the boundary.
pub trait RenderedPage {
    fn navigate(&mut self, url: &str, wait: WaitCondition, timeout: Duration)
    -> Result<(), PageError>;

    /// Run a JavaScript expression in the page and return its JSON result.
    fn evaluate(&mut self, script: &str) -> Result<Value, PageError>;

    /// PNG bytes of the current viewport, or the whole page when `full_page`.
    fn screenshot(&mut self, full_page: bool) -> Result<Vec<u8>, PageError>;

    fn wait_for_timeout(&mut self, duration: Duration) -> Result<(), PageError>;

    /// Register a listener for network responses. Listeners stay attached
    /// until the page is closed.
    fn on_response(&mut self, listener: ResponseListener);

    fn close(&mut self) -> Result<(), PageError>;

    /// Serialize the live document for analysis on this side of the boundary.
    fn snapshot(&mut self) -> Result<DomSnapshot, PageError> {
        let value = self.evaluate(script::DOM_SNAPSHOT)?;
        serde_json::from_value(value).map_err(|e| PageError::Json {
            context: "DOM snapshot".into(),
            source: e,
        })
    }

    fn title(&mut self) -> Result<String, PageError> {
        let value = self.evaluate(script::TITLE)?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    fn scroll_height(&mut self) -> Result<u64, PageError> {
        let value = self.evaluate(script::SCROLL_HEIGHT)?;
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|h| h as u64))
            .ok_or_else(|| PageError::Script(format!("scrollHeight was not a number: {}", value)))
    }

    fn scroll_to_bottom(&mut self) -> Result<(), PageError> {
        self.evaluate(script::SCROLL_TO_BOTTOM)?;
        Ok(())
    }
}
