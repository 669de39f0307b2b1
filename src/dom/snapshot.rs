use std::collections::{BTreeMap, HashMap};

use html5ever::{Attribute, LocalName, Namespace, QualName};
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector, StrTendril};
use serde::{Deserialize, Serialize};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

// ============================================================================
// Serialized page
// ============================================================================

/// The subset of computed style captured per element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComputedStyle {
    pub display: String,
    pub position: String,
    pub width: String,
    pub height: String,
    pub background_color: String,
    pub color: String,
    pub font_size: String,
    pub font_weight: String,
    pub padding: String,
    pub margin: String,
    pub border: String,
    pub z_index: String,
    pub cursor: String,
}

impl ComputedStyle {
    /// Build from an inline `style` attribute. Unknown properties are ignored.
    pub fn from_inline(style: &str) -> Self {
        let mut computed = ComputedStyle::default();
        for declaration in style.split(';') {
            let Some((property, value)) = declaration.split_once(':') else {
                continue;
            };
            let value = value.trim().to_string();
            match property.trim().to_ascii_lowercase().as_str() {
                "display" => computed.display = value,
                "position" => computed.position = value,
                "width" => computed.width = value,
                "height" => computed.height = value,
                "background-color" => computed.background_color = value,
                "color" => computed.color = value,
                "font-size" => computed.font_size = value,
                "font-weight" => computed.font_weight = value,
                "padding" => computed.padding = value,
                "margin" => computed.margin = value,
                "border" => computed.border = value,
                "z-index" => computed.z_index = value,
                "cursor" => computed.cursor = value,
                _ => {}
            }
        }
        computed
    }

    /// The style mapping recorded on a `PageElement` (cursor is only used for
    /// interactivity and is not part of it).
    pub fn to_map(&self) -> BTreeMap<String, String> {
        [
            ("display", &self.display),
            ("position", &self.position),
            ("width", &self.width),
            ("height", &self.height),
            ("backgroundColor", &self.background_color),
            ("color", &self.color),
            ("fontSize", &self.font_size),
            ("fontWeight", &self.font_weight),
            ("padding", &self.padding),
            ("margin", &self.margin),
            ("border", &self.border),
            ("zIndex", &self.z_index),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
    }
}

/// One node of a captured element tree: text, or an element with children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    Text(String),
    Element(SnapshotElement),
}

/// An element exactly as the live DOM holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotElement {
    /// Local name, e.g. `div` or `linearGradient`.
    pub tag: String,
    /// Namespace URI; HTML when absent.
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<SnapshotNode>,
}

impl SnapshotElement {
    fn to_node(&self) -> Node {
        let namespace = self.namespace.as_deref().unwrap_or(HTML_NAMESPACE);
        let name = QualName::new(None, Namespace::from(namespace), LocalName::from(self.tag.as_str()));
        let attributes = self
            .attributes
            .iter()
            .map(|(name, value)| Attribute {
                name: QualName::new(None, Namespace::from(""), LocalName::from(name.as_str())),
                value: value.as_str().into(),
            })
            .collect();
        Node::Element(Element::new(name, attributes))
    }
}

/// A document serialized across the page boundary plus the computed styles of
/// every element, keyed by DOM path.
///
/// Live pages send `root`, the element tree as the DOM holds it, so shapes the
/// HTML parser would rewrite (an `<a>` inside an `<a>`, nested forms) survive.
/// `html` is markup to parse instead and is only read when `root` is absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomSnapshot {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub root: Option<SnapshotElement>,
    #[serde(default)]
    pub styles: HashMap<String, ComputedStyle>,
}

impl DomSnapshot {
    /// Snapshot of static markup, with styles taken from inline `style`
    /// attributes.
    pub fn from_html(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let styles = parsed
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| in_document(*el))
            .filter_map(|el| {
                el.value()
                    .attr("style")
                    .map(|style| (dom_path(el), ComputedStyle::from_inline(style)))
            })
            .collect();
        DomSnapshot {
            html: html.to_string(),
            root: None,
            styles,
        }
    }
}

/// Rebuild a captured element tree without going through the HTML parser.
fn build_tree(root: &SnapshotElement) -> Html {
    let mut html = Html::new_document();
    let root_id = html.tree.root_mut().append(root.to_node()).id();

    let mut pending = vec![(root_id, root)];
    while let Some((id, element)) = pending.pop() {
        let Some(mut parent) = html.tree.get_mut(id) else {
            continue;
        };
        for child in &element.children {
            match child {
                SnapshotNode::Text(text) => {
                    parent.append(Node::Text(Text {
                        text: StrTendril::from(text.as_str()),
                    }));
                }
                SnapshotNode::Element(child) => {
                    let child_id = parent.append(child.to_node()).id();
                    pending.push((child_id, child));
                }
            }
        }
    }
    html
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("invalid selector '{selector}': {message}")]
    Invalid { selector: String, message: String },
}

// ============================================================================
// Queryable document
// ============================================================================

/// Parsed document with `querySelectorAll`-style access.
pub struct Document {
    html: Html,
    styles: HashMap<String, ComputedStyle>,
}

impl Document {
    pub fn from_snapshot(snapshot: DomSnapshot) -> Self {
        let html = match &snapshot.root {
            Some(root) => build_tree(root),
            None => Html::parse_document(&snapshot.html),
        };
        Document {
            html,
            styles: snapshot.styles,
        }
    }

    pub fn from_html(html: &str) -> Self {
        Document::from_snapshot(DomSnapshot::from_html(html))
    }

    /// All elements matching `selector`, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<ElementRef<'_>>, SelectorError> {
        let parsed = parse_selector(selector)?;
        Ok(self.html.select(&parsed).filter(|el| in_document(*el)).collect())
    }

    pub fn count(&self, selector: &str) -> Result<usize, SelectorError> {
        let parsed = parse_selector(selector)?;
        Ok(self.html.select(&parsed).filter(|el| in_document(*el)).count())
    }

    /// Every element in document order, starting with `<html>`.
    pub fn elements(&self) -> impl Iterator<Item = ElementRef<'_>> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| in_document(*el))
    }

    pub fn computed_style(&self, el: ElementRef<'_>) -> ComputedStyle {
        self.styles.get(&dom_path(el)).cloned().unwrap_or_default()
    }
}

pub fn parse_selector(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|e| SelectorError::Invalid {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

// ============================================================================
// Element accessors
// ============================================================================

pub fn tag_name(el: ElementRef<'_>) -> String {
    el.value().name().to_ascii_lowercase()
}

pub fn attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    el.value().attr(name)
}

/// Attribute value, treating an empty attribute as absent.
pub fn non_empty_attr<'a>(el: ElementRef<'a>, name: &str) -> Option<&'a str> {
    attr(el, name).filter(|v| !v.is_empty())
}

pub fn attributes(el: ElementRef<'_>) -> BTreeMap<String, String> {
    el.value()
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Classes in authored order.
pub fn classes(el: ElementRef<'_>) -> Vec<String> {
    attr(el, "class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

pub fn text_content(el: ElementRef<'_>) -> String {
    el.text().collect()
}

pub fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

pub fn child_elements(el: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    el.children().filter_map(ElementRef::wrap)
}

/// False for inert `<template>` content, which the parser keeps in a detached
/// fragment that `querySelectorAll` never reaches.
pub fn in_document(el: ElementRef<'_>) -> bool {
    !el.ancestors().any(|node| node.value().is_fragment())
}

/// 1-based position of `el` among its element siblings sharing its tag.
pub fn same_tag_position(el: ElementRef<'_>) -> (usize, usize) {
    let name = el.value().name();
    let before = el
        .prev_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|s| s.value().name() == name)
        .count();
    let after = el
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .filter(|s| s.value().name() == name)
        .count();
    (before + 1, before + after + 1)
}

/// Strictly positional path, e.g. `/html[1]/body[1]/div[2]`. Unique per
/// element, so prefix tests on it are exact ancestor tests.
pub fn dom_path(el: ElementRef<'_>) -> String {
    let mut segments = Vec::new();
    let mut current = Some(el);
    while let Some(node) = current {
        let (position, _) = same_tag_position(node);
        segments.push(format!("{}[{}]", tag_name(node), position));
        current = parent_element(node);
    }
    segments.reverse();
    format!("/{}", segments.join("/"))
}

/// XPath as exported on elements: `//*[@id="…"]` for elements with an id,
/// otherwise indexed steps from the nearest such ancestor or the root.
pub fn xpath(el: ElementRef<'_>) -> String {
    if let Some(id) = non_empty_attr(el, "id") {
        return format!("//*[@id=\"{}\"]", id);
    }

    let tag = tag_name(el);
    let parent = parent_element(el);
    match (tag.as_str(), parent) {
        ("html", _) => "/html".to_string(),
        ("body", Some(p)) if tag_name(p) == "html" => "/html/body".to_string(),
        (_, Some(p)) => format!("{}/{}[{}]", xpath(p), tag, same_tag_position(el).0),
        (_, None) => format!("/{}[{}]", tag, same_tag_position(el).0),
    }
}

/// Whether `path` lies strictly below `ancestor`.
pub fn is_descendant_path(path: &str, ancestor: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path[ancestor.len()..].starts_with('/')
}
