use page_insight::element::classifier::{
    ElementFacts, ExtractionContext, classify, element_type, is_interactive, slugify, unique_name,
};
use page_insight::element::element_model::ElementType;

fn facts(tag: &str, attrs: &[(&str, &str)], text: &str) -> ElementFacts {
    let attributes = attrs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let classes = attrs
        .iter()
        .find(|(k, _)| *k == "class")
        .map(|(_, v)| v.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    ElementFacts {
        tag: tag.to_string(),
        attributes,
        classes,
        text: text.to_string(),
        cursor: String::new(),
    }
}

// ============================================================================
// Element type rules
// ============================================================================

#[test]
fn tags_map_to_types() {
    let cases = [
        ("header", ElementType::Header),
        ("footer", ElementType::Footer),
        ("nav", ElementType::Navigation),
        ("form", ElementType::Form),
        ("button", ElementType::Button),
        ("input", ElementType::Input),
        ("textarea", ElementType::Input),
        ("select", ElementType::Input),
        ("a", ElementType::Link),
        ("img", ElementType::Image),
        ("picture", ElementType::Image),
        ("svg", ElementType::Image),
        ("ul", ElementType::List),
        ("ol", ElementType::List),
        ("main", ElementType::Container),
        ("section", ElementType::Container),
        ("article", ElementType::Container),
        ("div", ElementType::Container),
        ("p", ElementType::Text),
        ("span", ElementType::Text),
        ("h1", ElementType::Text),
        ("h6", ElementType::Text),
        ("table", ElementType::Other),
        ("aside", ElementType::Other),
    ];

    for (tag, expected) in cases {
        assert_eq!(element_type(&facts(tag, &[], "")), expected, "tag {}", tag);
    }
}

#[test]
fn landmark_roles_classify_any_tag() {
    assert_eq!(element_type(&facts("div", &[("role", "banner")], "")), ElementType::Header);
    assert_eq!(element_type(&facts("div", &[("role", "contentinfo")], "")), ElementType::Footer);
    assert_eq!(element_type(&facts("ul", &[("role", "navigation")], "")), ElementType::Navigation);
    assert_eq!(element_type(&facts("section", &[("role", "dialog")], "")), ElementType::Modal);
    assert_eq!(element_type(&facts("div", &[("class", "card modal")], "")), ElementType::Modal);
}

#[test]
fn earlier_rules_win_ties() {
    // header beats navigation, navigation beats modal, modal beats the tag.
    assert_eq!(element_type(&facts("header", &[("role", "navigation")], "")), ElementType::Header);
    assert_eq!(element_type(&facts("nav", &[("class", "modal")], "")), ElementType::Navigation);
    assert_eq!(element_type(&facts("form", &[("role", "dialog")], "")), ElementType::Modal);
    assert_eq!(element_type(&facts("a", &[("role", "navigation")], "")), ElementType::Navigation);
}

#[test]
fn submit_inputs_are_buttons() {
    assert_eq!(element_type(&facts("input", &[("type", "submit")], "")), ElementType::Button);
    assert_eq!(element_type(&facts("input", &[("type", "text")], "")), ElementType::Input);
    assert_eq!(element_type(&facts("input", &[], "")), ElementType::Input);
}

// ============================================================================
// Interactivity
// ============================================================================

#[test]
fn interactivity_signals() {
    assert!(is_interactive(&facts("a", &[], "")));
    assert!(is_interactive(&facts("select", &[], "")));
    assert!(is_interactive(&facts("span", &[("role", "tab")], "")));
    assert!(is_interactive(&facts("li", &[("role", "option")], "")));
    assert!(is_interactive(&facts("div", &[("onclick", "go()")], "")));

    let mut pointer = facts("div", &[], "");
    pointer.cursor = "pointer".into();
    assert!(is_interactive(&pointer));

    assert!(!is_interactive(&facts("div", &[], "")));
    assert!(!is_interactive(&facts("div", &[("role", "region")], "")));
}

// ============================================================================
// Unique names
// ============================================================================

#[test]
fn unique_name_tiers() {
    let mut ctx = ExtractionContext::new();
    let mut name = |f: ElementFacts| unique_name(&f, element_type(&f), &mut ctx);

    assert_eq!(name(facts("button", &[("data-testid", "submit-btn"), ("id", "x")], "Go")), "submit_btn");
    assert_eq!(name(facts("div", &[("id", "main nav")], "")), "main_nav");
    assert_eq!(name(facts("button", &[("aria-label", "Close Dialog!")], "x")), "close_dialog");
    assert_eq!(name(facts("a", &[], "  Sign Up Now  ")), "sign_up_now");
    assert_eq!(name(facts("div", &[("class", "hero-banner big")], "")), "hero_banner");
}

#[test]
fn text_tier_uses_first_thirty_characters() {
    let mut ctx = ExtractionContext::new();
    let f = facts("h2", &[], "This is a very long heading text that goes on");
    assert_eq!(unique_name(&f, ElementType::Text, &mut ctx), "this_is_a_very_long_heading_te");
}

#[test]
fn empty_tier_falls_through() {
    let mut ctx = ExtractionContext::new();
    let f = facts("button", &[("aria-label", "!!!")], "Buy");
    assert_eq!(unique_name(&f, ElementType::Button, &mut ctx), "buy");
}

#[test]
fn fallback_names_share_one_counter() {
    let mut ctx = ExtractionContext::new();
    let div = facts("div", &[], "");
    let button = facts("button", &[], "   ");

    assert_eq!(classify(&div, &mut ctx).unique_name, "container_0");
    assert_eq!(classify(&button, &mut ctx).unique_name, "button_1");
    assert_eq!(classify(&div, &mut ctx).unique_name, "container_2");

    let mut fresh = ExtractionContext::new();
    assert_eq!(classify(&div, &mut fresh).unique_name, "container_0");
}

#[test]
fn element_ids_are_sequential_per_context() {
    let mut ctx = ExtractionContext::new();
    assert_eq!(ctx.next_element_id(), "element_0");
    assert_eq!(ctx.next_element_id(), "element_1");
    assert_eq!(ExtractionContext::new().next_element_id(), "element_0");
}

#[test]
fn names_are_identifier_safe() {
    let mut ctx = ExtractionContext::new();
    let f = facts("div", &[("id", "caf\u{e9}.menu#1")], "");
    assert_eq!(unique_name(&f, ElementType::Container, &mut ctx), "cafmenu1");
}

#[test]
fn slugify_collapses_runs() {
    assert_eq!(slugify("  Hello,   World! "), "hello_world");
    assert_eq!(slugify("---"), "");
    assert_eq!(slugify("Step 2 of 3"), "step_2_of_3");
}
