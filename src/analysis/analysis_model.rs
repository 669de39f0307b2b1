use serde::{Deserialize, Serialize};

use crate::element::element_model::{ElementType, PageElement, PageSection};
use crate::flow::flow_model::UserFlow;
use crate::network::api_model::ApiCall;

// ============================================================================
// Page analysis, the artifact handed to code generators
// ============================================================================

/// Simple counts over the extracted elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub total_elements: usize,
    pub test_ids: usize,
    pub interactive_elements: usize,
    pub forms: usize,
    pub modals: usize,
    pub tables: usize,
}

impl PageMetadata {
    /// Counts over `elements`. `tables` is left at zero: tables are not
    /// extraction targets, so the extractor counts them on the document.
    pub fn from_elements(elements: &[PageElement]) -> Self {
        PageMetadata {
            total_elements: elements.len(),
            test_ids: elements.iter().filter(|e| e.test_id.is_some()).count(),
            interactive_elements: elements.iter().filter(|e| e.is_interactive).count(),
            forms: count_type(elements, ElementType::Form),
            modals: count_type(elements, ElementType::Modal),
            tables: 0,
        }
    }
}

fn count_type(elements: &[PageElement], element_type: ElementType) -> usize {
    elements
        .iter()
        .filter(|e| e.element_type == element_type)
        .count()
}

/// Structured model of one analyzed URL.
///
/// Built whole by the extractor, then extended exactly twice (recorded API
/// calls, inferred flows) before it is handed downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub url: String,
    pub title: String,
    pub elements: Vec<PageElement>,
    /// `data:image/png;base64,…`
    pub screenshot: String,
    pub sections: Vec<PageSection>,
    pub interactive_elements: Vec<PageElement>,
    pub user_flows: Vec<UserFlow>,
    pub api_routes: Vec<ApiCall>,
    pub metadata: PageMetadata,
    /// SHA-1 over the ordered `(elementType, selector)` pairs.
    pub fingerprint: String,
}

impl PageAnalysis {
    /// Appends in arrival order, no dedup.
    pub fn append_api_calls(&mut self, calls: impl IntoIterator<Item = ApiCall>) {
        self.api_routes.extend(calls);
    }

    pub fn append_flows(&mut self, flows: impl IntoIterator<Item = UserFlow>) {
        self.user_flows.extend(flows);
    }
}

pub fn structure_fingerprint(elements: &[PageElement]) -> String {
    use sha1::{Digest, Sha1};

    let mut hasher = Sha1::new();
    for element in elements {
        hasher.update(element.element_type.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(element.selector.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
