use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::dom::snapshot::{Document, attributes, classes, tag_name, text_content};
use crate::element::element_model::ElementType;
use crate::element::selector::TEST_ID_ATTRIBUTES;

const INTERACTIVE_TAGS: [&str; 5] = ["button", "a", "input", "select", "textarea"];
const INTERACTIVE_ROLES: [&str; 5] = ["button", "link", "tab", "menuitem", "option"];

/// Characters of text content considered when naming an element.
const NAME_TEXT_CHARS: usize = 30;

static HYPHEN_OR_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\s]").expect("hyphen regex is valid"));
static NON_ALNUM_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("non-alnum regex is valid"));
static NON_IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("identifier regex is valid"));

// ============================================================================
// Per-run counters
// ============================================================================

/// Counters scoped to one extraction pass.
///
/// Element ids and fallback names are only unique within the pass that
/// issued them; a fresh context restarts both sequences.
#[derive(Debug, Default)]
pub struct ExtractionContext {
    next_element: usize,
    next_fallback: usize,
}

impl ExtractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_element_id(&mut self) -> String {
        let id = format!("element_{}", self.next_element);
        self.next_element += 1;
        id
    }

    /// `<type>_<n>`, with `n` shared by every element type.
    pub fn next_fallback_name(&mut self, element_type: ElementType) -> String {
        let name = format!("{}_{}", element_type, self.next_fallback);
        self.next_fallback += 1;
        name
    }
}

// ============================================================================
// Element facts
// ============================================================================

/// What the classifier looks at, lifted out of the document so that
/// classification is a plain function of data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementFacts {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub classes: Vec<String>,
    pub text: String,
    pub cursor: String,
}

impl ElementFacts {
    pub fn from_node(document: &Document, el: ElementRef<'_>) -> Self {
        ElementFacts {
            tag: tag_name(el),
            attributes: attributes(el),
            classes: classes(el),
            text: text_content(el),
            cursor: document.computed_style(el).cursor,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn role(&self) -> Option<&str> {
        self.attr("role")
    }

    pub fn test_id(&self) -> Option<&str> {
        TEST_ID_ATTRIBUTES.iter().find_map(|name| self.attr(name))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub element_type: ElementType,
    pub is_interactive: bool,
    pub unique_name: String,
}

// ============================================================================
// Classification
// ============================================================================

pub fn classify(facts: &ElementFacts, context: &mut ExtractionContext) -> Classification {
    let element_type = element_type(facts);
    Classification {
        element_type,
        is_interactive: is_interactive(facts),
        unique_name: unique_name(facts, element_type, context),
    }
}

/// First match wins; landmark roles are checked before tags.
pub fn element_type(facts: &ElementFacts) -> ElementType {
    let tag = facts.tag.as_str();
    let role = facts.role();

    if role == Some("banner") || tag == "header" {
        return ElementType::Header;
    }
    if role == Some("contentinfo") || tag == "footer" {
        return ElementType::Footer;
    }
    if role == Some("navigation") || tag == "nav" {
        return ElementType::Navigation;
    }
    if role == Some("dialog") || facts.has_class("modal") {
        return ElementType::Modal;
    }

    match tag {
        "form" => ElementType::Form,
        "button" => ElementType::Button,
        "input" if facts.attr("type") == Some("submit") => ElementType::Button,
        "input" | "textarea" | "select" => ElementType::Input,
        "a" => ElementType::Link,
        "img" | "picture" | "svg" => ElementType::Image,
        "ul" | "ol" => ElementType::List,
        "main" | "section" | "article" | "div" => ElementType::Container,
        "p" | "span" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => ElementType::Text,
        _ => ElementType::Other,
    }
}

pub fn is_interactive(facts: &ElementFacts) -> bool {
    INTERACTIVE_TAGS.contains(&facts.tag.as_str())
        || facts.role().is_some_and(|r| INTERACTIVE_ROLES.contains(&r))
        || facts.attr("onclick").is_some()
        || facts.cursor == "pointer"
}

/// Identifier-safe name; see [`ExtractionContext`] for the fallback sequence.
pub fn unique_name(
    facts: &ElementFacts,
    element_type: ElementType,
    context: &mut ExtractionContext,
) -> String {
    let text: String = facts.text.trim().chars().take(NAME_TEXT_CHARS).collect();

    let candidates = [
        facts.test_id().map(underscore_separators),
        facts.attr("id").map(underscore_separators),
        facts.attr("aria-label").map(slugify),
        Some(slugify(&text)),
        facts.classes.first().map(|c| underscore_separators(c)),
    ];

    candidates
        .into_iter()
        .flatten()
        .map(|name| sanitize_identifier(&name))
        .find(|name| !name.is_empty())
        .unwrap_or_else(|| context.next_fallback_name(element_type))
}

fn underscore_separators(value: &str) -> String {
    HYPHEN_OR_SPACE.replace_all(value, "_").into_owned()
}

/// Lowercase, collapse non-alphanumeric runs to `_`, trim edge underscores.
pub fn slugify(value: &str) -> String {
    let lower = value.to_lowercase();
    NON_ALNUM_RUN
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}

fn sanitize_identifier(value: &str) -> String {
    NON_IDENTIFIER.replace_all(value, "").into_owned()
}
