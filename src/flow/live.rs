use std::time::Duration;

use scraper::{ElementRef, Selector};
use tracing::{debug, info, warn};

use crate::browser::page::{PageError, RenderedPage};
use crate::dom::snapshot::{
    Document, SelectorError, classes, in_document, non_empty_attr, parse_selector, tag_name,
    text_content,
};
use crate::element::selector::{css_escape, escape_attribute_value};
use crate::flow::detectors::Detector;
use crate::flow::flow_model::UserFlow;
use crate::network::api_model::ApiCall;

/// Selector emitted when a step target cannot be described.
pub const UNKNOWN_SELECTOR: &str = "unknown";

#[derive(Debug, Clone)]
pub struct LiveDetectionConfig {
    /// How long to wait after scrolling before re-measuring the page.
    pub scroll_settle: Duration,
}

impl Default for LiveDetectionConfig {
    fn default() -> Self {
        Self {
            scroll_settle: Duration::from_secs(1),
        }
    }
}

/// Shared inputs every detector reads.
pub struct DetectionContext<'a> {
    /// API calls recorded so far in the session.
    pub api_calls: &'a [ApiCall],
    pub config: &'a LiveDetectionConfig,
}

impl DetectionContext<'_> {
    /// Recorded calls whose URL contains any of `needles`.
    pub fn calls_matching(&self, needles: &[&str]) -> Vec<ApiCall> {
        crate::network::api_model::calls_matching(self.api_calls, needles)
    }

    pub fn all_calls(&self) -> Vec<ApiCall> {
        self.api_calls.to_vec()
    }
}

/// Run every detector in order against the live page. A detector that fails
/// is logged and skipped; the rest still run.
pub fn detect_user_flows(
    page: &mut dyn RenderedPage,
    api_calls: &[ApiCall],
    config: &LiveDetectionConfig,
) -> Vec<UserFlow> {
    let mut probe = Probe::new(page);
    let ctx = DetectionContext { api_calls, config };

    let mut flows = Vec::new();
    for detector in Detector::ALL {
        match detector.detect(&mut probe, &ctx) {
            Ok(Some(flow)) => {
                debug!(detector = detector.name(), steps = flow.steps.len(), "flow detected");
                flows.push(flow);
            }
            Ok(None) => debug!(detector = detector.name(), "no flow"),
            Err(e) => warn!(detector = detector.name(), error = %e, "flow detector failed, skipping"),
        }
    }
    info!(count = flows.len(), "live flow detection finished");
    flows
}

// ============================================================================
// Probing the live document
// ============================================================================

/// Page handle plus a lazily captured document snapshot. Anything that may
/// change the page goes through [`Probe::page`], which drops the snapshot.
pub struct Probe<'p> {
    page: &'p mut dyn RenderedPage,
    document: Option<Document>,
}

impl<'p> Probe<'p> {
    pub fn new(page: &'p mut dyn RenderedPage) -> Self {
        Self { page, document: None }
    }

    /// The current document, captured on first use.
    pub fn document(&mut self) -> Result<&Document, PageError> {
        let document = match self.document.take() {
            Some(document) => document,
            None => Document::from_snapshot(self.page.snapshot()?),
        };
        Ok(self.document.insert(document))
    }

    /// Mutable page access. Invalidates the cached document.
    pub fn page(&mut self) -> &mut dyn RenderedPage {
        self.document = None;
        &mut *self.page
    }
}

/// One alternative in a locator union.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    Css(&'static str),
    /// A `<button>` whose text contains the needle, ignoring case.
    ButtonText(&'static str),
}

enum CompiledQuery {
    Css(Selector),
    ButtonText(String),
}

impl CompiledQuery {
    fn matches(&self, el: &ElementRef<'_>) -> bool {
        match self {
            CompiledQuery::Css(selector) => selector.matches(el),
            CompiledQuery::ButtonText(needle) => {
                tag_name(*el) == "button" && text_content(*el).to_lowercase().contains(needle)
            }
        }
    }
}

fn compile(queries: &[Query]) -> Vec<CompiledQuery> {
    queries
        .iter()
        .filter_map(|query| match query {
            Query::Css(css) => match parse_selector(css) {
                Ok(selector) => Some(CompiledQuery::Css(selector)),
                Err(e) => {
                    debug!(error = %e, "skipping unparseable query");
                    None
                }
            },
            Query::ButtonText(needle) => Some(CompiledQuery::ButtonText(needle.to_lowercase())),
        })
        .collect()
}

/// Elements matching any of `queries`, each once, in document order.
pub fn find_all<'d>(document: &'d Document, queries: &[Query]) -> Vec<ElementRef<'d>> {
    let compiled = compile(queries);
    document
        .elements()
        .filter(|el| compiled.iter().any(|query| query.matches(el)))
        .collect()
}

pub fn find_first<'d>(document: &'d Document, queries: &[Query]) -> Option<ElementRef<'d>> {
    let compiled = compile(queries);
    document
        .elements()
        .find(|el| compiled.iter().any(|query| query.matches(el)))
}

/// Descendants of `scope` matching `queries`, in document order.
pub fn find_within<'d>(scope: ElementRef<'d>, queries: &[Query]) -> Vec<ElementRef<'d>> {
    let compiled = compile(queries);
    scope
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|el| in_document(*el))
        .filter(|el| compiled.iter().any(|query| query.matches(el)))
        .collect()
}

// ============================================================================
// Step selectors
// ============================================================================

/// Selector for a step target: test id, then id, then aria-label, then tag
/// with up to two classes. Falls back to [`UNKNOWN_SELECTOR`].
pub fn step_selector(el: ElementRef<'_>) -> String {
    match describe(el) {
        Ok(selector) => selector,
        Err(e) => {
            debug!(error = %e, "could not describe step target");
            UNKNOWN_SELECTOR.to_string()
        }
    }
}

fn describe(el: ElementRef<'_>) -> Result<String, SelectorError> {
    let selector = if let Some(test_id) = non_empty_attr(el, "data-testid") {
        format!("[data-testid=\"{}\"]", escape_attribute_value(test_id))
    } else if let Some(id) = non_empty_attr(el, "id") {
        format!("#{}", css_escape(id))
    } else if let Some(label) = non_empty_attr(el, "aria-label") {
        format!("[aria-label=\"{}\"]", escape_attribute_value(label))
    } else {
        let tag = tag_name(el);
        let classes = classes(el);
        if classes.is_empty() {
            tag
        } else {
            let first_two: Vec<String> = classes.iter().take(2).map(|c| css_escape(c)).collect();
            format!("{}.{}", tag, first_two.join("."))
        }
    };

    parse_selector(&selector)?;
    Ok(selector)
}
