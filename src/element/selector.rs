use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;
use tracing::debug;

use crate::dom::snapshot::{
    Document, classes, non_empty_attr, parent_element, same_tag_position, tag_name,
};

/// Checked in this order; whichever matches is emitted as `data-testid`.
pub const TEST_ID_ATTRIBUTES: [&str; 3] = ["data-testid", "data-test", "data-qa"];

const MAX_SELECTOR_CLASSES: usize = 3;

static SAFE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z_-][a-zA-Z0-9_-]*$").expect("safe class regex is valid")
});

/// First non-empty test-id attribute value.
pub fn test_id(el: ElementRef<'_>) -> Option<&str> {
    TEST_ID_ATTRIBUTES
        .iter()
        .find_map(|name| non_empty_attr(el, name))
}

/// Build the selector recorded for `el`.
///
/// Priority: test id, element id, `tag.class…` when unique in `document`,
/// then a structural path anchored at the nearest ancestor with an id.
pub fn synthesize(el: ElementRef<'_>, document: &Document) -> String {
    if let Some(value) = test_id(el) {
        return test_id_selector(value);
    }

    if let Some(id) = non_empty_attr(el, "id") {
        return format!("#{}", css_escape(id));
    }

    if let Some(selector) = unique_class_selector(el, document) {
        return selector;
    }

    structural_path(el)
}

pub fn test_id_selector(value: &str) -> String {
    format!("[data-testid=\"{}\"]", escape_attribute_value(value))
}

/// `tag.a.b.c` from the first safe classes, only if it matches exactly one
/// node.
fn unique_class_selector(el: ElementRef<'_>, document: &Document) -> Option<String> {
    let safe: Vec<String> = classes(el)
        .iter()
        .filter(|c| SAFE_CLASS.is_match(c))
        .take(MAX_SELECTOR_CLASSES)
        .map(|c| css_escape(c))
        .collect();

    if safe.is_empty() {
        return None;
    }

    let selector = format!("{}.{}", tag_name(el), safe.join("."));
    match document.count(&selector) {
        Ok(1) => Some(selector),
        Ok(matches) => {
            debug!(%selector, matches, "class selector not unique");
            None
        }
        Err(e) => {
            debug!("class selector rejected: {}", e);
            None
        }
    }
}

/// Walk up from `el`, one `tag` segment per level with `:nth-of-type(k)` when
/// same-tag siblings exist, stopping at the first ancestor carrying an id.
pub fn structural_path(el: ElementRef<'_>) -> String {
    let mut segments = Vec::new();
    let mut current = el;

    loop {
        let tag = tag_name(current);
        let (position, total) = same_tag_position(current);
        if total > 1 {
            segments.push(format!("{}:nth-of-type({})", tag, position));
        } else {
            segments.push(tag);
        }

        let Some(parent) = parent_element(current) else {
            break;
        };
        if let Some(id) = non_empty_attr(parent, "id") {
            segments.push(format!("#{}", css_escape(id)));
            break;
        }
        current = parent;
    }

    segments.reverse();
    segments.join(" > ")
}

/// CSS identifier escaping, as `CSS.escape` does it.
pub fn css_escape(ident: &str) -> String {
    let chars: Vec<char> = ident.chars().collect();
    let mut escaped = String::with_capacity(ident.len());

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\0' => escaped.push('\u{FFFD}'),
            '\u{1}'..='\u{1F}' | '\u{7F}' => escaped.push_str(&format!("\\{:x} ", c as u32)),
            '0'..='9' if i == 0 || (i == 1 && chars[0] == '-') => {
                escaped.push_str(&format!("\\{:x} ", c as u32))
            }
            '-' if i == 0 && chars.len() == 1 => escaped.push_str("\\-"),
            c if c as u32 >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() => {
                escaped.push(c)
            }
            c => {
                escaped.push('\\');
                escaped.push(c);
            }
        }
    }

    escaped
}

pub fn escape_attribute_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
