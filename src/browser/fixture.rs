use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use scraper::Html;
use serde_json::Value;
use tracing::debug;

use crate::browser::page::{
    NetworkResponse, PageError, RenderedPage, ResponseListener, WaitCondition,
};
use crate::dom::snapshot::{DomSnapshot, parse_selector};

/// PNG file signature; stands in for a screenshot when none is configured.
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A page backed by fixed HTML instead of a browser.
///
/// Used for offline analysis of saved markup and for exercising the analysis
/// pipeline deterministically: navigation failures, `scrollHeight` growth and
/// network traffic are all scripted.
pub struct StaticPage {
    html: String,
    url: Option<String>,
    title: Option<String>,
    failures: HashMap<WaitCondition, String>,
    attempts: Vec<WaitCondition>,
    scroll_heights: VecDeque<u64>,
    last_height: u64,
    scrolls: usize,
    responses: Vec<NetworkResponse>,
    listeners: Vec<ResponseListener>,
    screenshot: Vec<u8>,
    snapshot_failure: Option<String>,
    closed: Arc<AtomicBool>,
}

impl StaticPage {
    pub fn new(html: impl Into<String>) -> Self {
        StaticPage {
            html: html.into(),
            url: None,
            title: None,
            failures: HashMap::new(),
            attempts: Vec::new(),
            scroll_heights: VecDeque::new(),
            last_height: 0,
            scrolls: 0,
            responses: Vec::new(),
            listeners: Vec::new(),
            screenshot: PNG_SIGNATURE.to_vec(),
            snapshot_failure: None,
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Make navigations waiting on `wait` fail with `message`.
    pub fn fail_navigation(mut self, wait: WaitCondition, message: impl Into<String>) -> Self {
        self.failures.insert(wait, message.into());
        self
    }

    /// Successive values returned by `scroll_height`; the last one repeats.
    pub fn with_scroll_heights(mut self, heights: impl IntoIterator<Item = u64>) -> Self {
        self.scroll_heights = heights.into_iter().collect();
        self
    }

    /// A response delivered to listeners on every successful navigation.
    pub fn with_response(mut self, response: NetworkResponse) -> Self {
        self.responses.push(response);
        self
    }

    pub fn with_screenshot(mut self, png: Vec<u8>) -> Self {
        self.screenshot = png;
        self
    }

    /// Make every snapshot fail, as if the document vanished mid-analysis.
    pub fn fail_snapshot(mut self, message: impl Into<String>) -> Self {
        self.snapshot_failure = Some(message.into());
        self
    }

    /// Wait conditions tried so far, in order.
    pub fn navigation_attempts(&self) -> &[WaitCondition] {
        &self.attempts
    }

    pub fn scroll_count(&self) -> usize {
        self.scrolls
    }

    /// Shared flag flipped by `close`, observable after the page is consumed.
    pub fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), PageError> {
        if self.is_closed() {
            Err(PageError::Closed)
        } else {
            Ok(())
        }
    }
}

impl RenderedPage for StaticPage {
    fn navigate(
        &mut self,
        url: &str,
        wait: WaitCondition,
        _timeout: Duration,
    ) -> Result<(), PageError> {
        self.ensure_open()?;
        self.attempts.push(wait);

        if let Some(message) = self.failures.get(&wait) {
            return Err(PageError::Navigation(message.clone()));
        }

        self.url = Some(url.to_string());
        for response in &self.responses {
            for listener in &self.listeners {
                listener(response);
            }
        }
        debug!(url, %wait, "static page navigated");
        Ok(())
    }

    fn evaluate(&mut self, script: &str) -> Result<Value, PageError> {
        self.ensure_open()?;
        Err(PageError::Script(format!(
            "static pages cannot evaluate scripts ({} bytes)",
            script.len()
        )))
    }

    fn screenshot(&mut self, _full_page: bool) -> Result<Vec<u8>, PageError> {
        self.ensure_open()?;
        Ok(self.screenshot.clone())
    }

    fn wait_for_timeout(&mut self, _duration: Duration) -> Result<(), PageError> {
        self.ensure_open()
    }

    fn on_response(&mut self, listener: ResponseListener) {
        self.listeners.push(listener);
    }

    fn close(&mut self) -> Result<(), PageError> {
        self.closed.store(true, Ordering::SeqCst);
        self.listeners.clear();
        Ok(())
    }

    fn snapshot(&mut self) -> Result<DomSnapshot, PageError> {
        self.ensure_open()?;
        if let Some(message) = &self.snapshot_failure {
            return Err(PageError::Script(message.clone()));
        }
        Ok(DomSnapshot::from_html(&self.html))
    }

    fn title(&mut self) -> Result<String, PageError> {
        self.ensure_open()?;
        if let Some(title) = &self.title {
            return Ok(title.clone());
        }
        let parsed = Html::parse_document(&self.html);
        let title = parse_selector("title")
            .ok()
            .and_then(|sel| {
                parsed
                    .select(&sel)
                    .next()
                    .map(|t| t.text().collect::<String>())
            })
            .unwrap_or_default();
        Ok(title.trim().to_string())
    }

    fn scroll_height(&mut self) -> Result<u64, PageError> {
        self.ensure_open()?;
        if let Some(height) = self.scroll_heights.pop_front() {
            self.last_height = height;
        }
        Ok(self.last_height)
    }

    fn scroll_to_bottom(&mut self) -> Result<(), PageError> {
        self.ensure_open()?;
        self.scrolls += 1;
        Ok(())
    }
}
