use std::collections::HashSet;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use scraper::ElementRef;
use tracing::{debug, info};

use crate::analysis::analysis_model::{PageAnalysis, PageMetadata, structure_fingerprint};
use crate::analysis::error::AnalysisError;
use crate::browser::page::{PageError, RenderedPage};
use crate::dom::snapshot::{Document, dom_path, non_empty_attr, xpath};
use crate::element::classifier::{ElementFacts, ExtractionContext, classify};
use crate::element::element_model::PageElement;
use crate::element::selector::{synthesize, test_id};
use crate::extract::navigation::navigate_with_fallback;
use crate::extract::sections::categorize_sections;

/// Structural and semantic queries whose matches make up the element list.
pub const EXTRACTION_SELECTORS: [&str; 26] = [
    "header",
    "footer",
    "nav",
    "main",
    "aside",
    "section",
    "article",
    "form",
    "button",
    "a",
    "input",
    "textarea",
    "select",
    "img",
    "[data-testid]",
    "[data-test]",
    "[data-qa]",
    "[role=\"dialog\"]",
    "[role=\"banner\"]",
    "[role=\"navigation\"]",
    ".modal",
    ".dropdown",
    ".menu",
    "h1",
    "h2",
    "h3",
];

/// Characters of trimmed text content kept on each element.
const TEXT_LIMIT: usize = 100;

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Per wait-condition navigation timeout.
    pub navigation_timeout: Duration,
    /// Pause after navigation for client-side rendering to finish.
    pub settle_delay: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(2),
        }
    }
}

/// Builds a [`PageAnalysis`] from a rendered page.
pub struct PageExtractor {
    config: ExtractorConfig,
}

impl PageExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Navigate to `url`, let the page settle, then extract.
    pub fn analyze(
        &self,
        page: &mut dyn RenderedPage,
        url: &str,
    ) -> Result<PageAnalysis, AnalysisError> {
        let wait = navigate_with_fallback(page, url, self.config.navigation_timeout)?;
        info!(url, %wait, "page loaded");

        page.wait_for_timeout(self.config.settle_delay)?;
        Ok(self.extract(page, url)?)
    }

    /// Extract from a page that is already showing `url`.
    pub fn extract(&self, page: &mut dyn RenderedPage, url: &str) -> Result<PageAnalysis, PageError> {
        let document = Document::from_snapshot(page.snapshot()?);
        let elements = extract_elements(&document);
        let sections = categorize_sections(&elements);
        let interactive_elements: Vec<PageElement> =
            elements.iter().filter(|e| e.is_interactive).cloned().collect();

        let png = page.screenshot(true)?;
        let screenshot = format!("data:image/png;base64,{}", STANDARD.encode(png));
        let title = page.title()?;

        info!(
            url,
            elements = elements.len(),
            sections = sections.len(),
            interactive = interactive_elements.len(),
            "extraction complete"
        );

        Ok(PageAnalysis {
            url: url.to_string(),
            title,
            metadata: PageMetadata {
                tables: document.count("table").unwrap_or_default(),
                ..PageMetadata::from_elements(&elements)
            },
            fingerprint: structure_fingerprint(&elements),
            screenshot,
            sections,
            interactive_elements,
            user_flows: Vec::new(),
            api_routes: Vec::new(),
            elements,
        })
    }
}

/// Run every extraction query, keep each matched node once (first query to
/// match it decides its position) and turn it into a [`PageElement`].
pub fn extract_elements(document: &Document) -> Vec<PageElement> {
    let mut context = ExtractionContext::new();
    let mut seen = HashSet::new();
    let mut elements = Vec::new();

    for selector in EXTRACTION_SELECTORS {
        let matches = match document.select(selector) {
            Ok(matches) => matches,
            Err(e) => {
                debug!("skipping extraction query: {}", e);
                continue;
            }
        };

        for el in matches {
            let path = dom_path(el);
            if seen.insert(path.clone()) {
                elements.push(build_element(document, el, path, &mut context));
            }
        }
    }

    elements
}

fn build_element(
    document: &Document,
    el: ElementRef<'_>,
    dom_path: String,
    context: &mut ExtractionContext,
) -> PageElement {
    let facts = ElementFacts::from_node(document, el);
    let classification = classify(&facts, context);

    let trimmed: String = facts.text.trim().chars().take(TEXT_LIMIT).collect();

    PageElement {
        id: context.next_element_id(),
        tag_name: facts.tag.clone(),
        selector: synthesize(el, document),
        test_id: test_id(el).map(str::to_string),
        aria_label: non_empty_attr(el, "aria-label").map(str::to_string),
        role: non_empty_attr(el, "role").map(str::to_string),
        text: Some(trimmed).filter(|t| !t.is_empty()),
        classes: facts.classes,
        styles: document.computed_style(el).to_map(),
        attributes: facts.attributes,
        xpath: xpath(el),
        dom_path,
        is_interactive: classification.is_interactive,
        element_type: classification.element_type,
        unique_name: classification.unique_name,
    }
}
