use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Element taxonomy
// ============================================================================

/// Semantic type of an extracted element. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Header,
    Footer,
    Navigation,
    Modal,
    Form,
    Button,
    Input,
    Link,
    Image,
    List,
    Container,
    Text,
    Other,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Header => "header",
            ElementType::Footer => "footer",
            ElementType::Navigation => "navigation",
            ElementType::Modal => "modal",
            ElementType::Form => "form",
            ElementType::Button => "button",
            ElementType::Input => "input",
            ElementType::Link => "link",
            ElementType::Image => "image",
            ElementType::List => "list",
            ElementType::Container => "container",
            ElementType::Text => "text",
            ElementType::Other => "other",
        }
    }

    /// Type string with its first letter uppercased, e.g. `Navigation`.
    pub fn display_name(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Extracted elements
// ============================================================================

/// One observed DOM node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageElement {
    /// Unique within one extraction run only.
    pub id: String,
    pub tag_name: String,
    pub selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aria_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// First 100 characters of the trimmed text content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub classes: Vec<String>,
    pub styles: BTreeMap<String, String>,
    pub attributes: BTreeMap<String, String>,
    pub xpath: String,
    /// Positional path; exact structural containment is tested on this.
    pub dom_path: String,
    pub is_interactive: bool,
    pub element_type: ElementType,
    pub unique_name: String,
}

impl PageElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Whether this element sits strictly inside `ancestor` in the DOM.
    pub fn is_inside(&self, ancestor: &PageElement) -> bool {
        crate::dom::snapshot::is_descendant_path(&self.dom_path, &ancestor.dom_path)
    }

    pub fn text_contains(&self, needle: &str) -> bool {
        self.text
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(needle))
    }
}

/// A named group of elements sharing one semantic role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSection {
    pub name: String,
    #[serde(rename = "type")]
    pub section_type: ElementType,
    pub elements: Vec<PageElement>,
    pub selector: String,
}
