use crate::analysis::analysis_model::PageAnalysis;
use crate::browser::page::WaitCondition;
use crate::element::element_model::{ElementType, PageElement};
use crate::flow::flow_model::{Assertion, FlowStep, Interaction, UserFlow, VisualCheckpoint};
use crate::flow::values::mock_value;

/// Navigation flows click through at most this many links.
const MAX_NAV_STEPS: usize = 5;

/// Derive flows from an already-extracted analysis, without touching the
/// page: form flows, then the navigation flow, then component flows.
pub fn analyze_patterns(analysis: &PageAnalysis) -> Vec<UserFlow> {
    let elements = analysis.elements.as_slice();

    let mut flows = form_flows(elements);
    flows.extend(navigation_flow(elements));
    flows.extend(component_flows(elements));
    flows
}

/// One fill-and-submit flow per form containing at least one input.
pub fn form_flows(elements: &[PageElement]) -> Vec<UserFlow> {
    let mut flows = Vec::new();

    for form in of_type(elements, ElementType::Form) {
        let inputs: Vec<&PageElement> = of_type(elements, ElementType::Input)
            .filter(|input| input.is_inside(form))
            .collect();
        if inputs.is_empty() {
            continue;
        }

        let mut steps: Vec<FlowStep> = inputs
            .iter()
            .enumerate()
            .map(|(idx, input)| {
                FlowStep::new(
                    format!("form-step-{idx}"),
                    Interaction::fill(&input.selector, mock_value(input)),
                )
                .with_assertion(Assertion::visible(&input.selector))
            })
            .collect();

        if let Some(submit) = elements.iter().find(|el| is_submit_for(el, form)) {
            steps.push(FlowStep::new("form-submit", Interaction::click(&submit.selector)));
        }

        flows.push(UserFlow::new(
            format!("Form Submission - {}", form.unique_name),
            format!("Fill and submit {} form", form.unique_name),
            steps,
        ));
    }

    flows
}

fn is_submit_for(el: &PageElement, form: &PageElement) -> bool {
    (el.element_type == ElementType::Button || el.tag_name == "button")
        && el.is_inside(form)
        && (el.attribute("type") == Some("submit") || el.text_contains("submit"))
}

/// Click through up to five navigation elements, asserting the URL each
/// time.
pub fn navigation_flow(elements: &[PageElement]) -> Option<UserFlow> {
    let steps: Vec<FlowStep> = elements
        .iter()
        .filter(|el| {
            el.element_type == ElementType::Navigation
                || (el.element_type == ElementType::Link && el.role.as_deref() == Some("navigation"))
        })
        .take(MAX_NAV_STEPS)
        .enumerate()
        .map(|(idx, link)| {
            FlowStep::new(
                format!("nav-step-{idx}"),
                Interaction::click(&link.selector).wait_for(WaitCondition::NetworkIdle),
            )
            .with_assertion(Assertion::url(link.attribute("href").unwrap_or("/")))
        })
        .collect();

    if steps.is_empty() {
        return None;
    }

    let checkpoints = (1..=steps.len())
        .map(|n| VisualCheckpoint::full_page(format!("Navigation Step {n}")))
        .collect();

    Some(
        UserFlow::new("Navigation Flow", "Navigate through main menu items", steps)
            .with_checkpoints(checkpoints),
    )
}

/// Modal open flows, then a single flow over every tab.
pub fn component_flows(elements: &[PageElement]) -> Vec<UserFlow> {
    let mut flows = Vec::new();

    for modal in of_type(elements, ElementType::Modal) {
        let Some(trigger) = find_modal_trigger(elements, modal) else {
            continue;
        };
        let step = FlowStep::new("open-modal", Interaction::click(&trigger.selector))
            .with_assertion(Assertion::visible(&modal.selector));
        flows.push(
            UserFlow::new(
                format!("Modal Interaction - {}", modal.unique_name),
                format!("Open and interact with {}", modal.unique_name),
                vec![step],
            )
            .with_checkpoints(vec![VisualCheckpoint::element("Modal Open", &modal.selector)]),
        );
    }

    let tab_steps: Vec<FlowStep> = elements
        .iter()
        .filter(|el| el.role.as_deref() == Some("tab"))
        .enumerate()
        .map(|(idx, tab)| {
            FlowStep::new(format!("tab-{idx}"), Interaction::click(&tab.selector))
                .with_assertion(Assertion::visible(&tab.selector))
        })
        .collect();
    if !tab_steps.is_empty() {
        flows.push(UserFlow::new(
            "Tab Navigation",
            "Navigate through tab components",
            tab_steps,
        ));
    }

    flows
}

/// First button that points at `modal` by id (`data-target` or
/// `aria-controls`, with or without a leading `#`) or whose text mentions
/// "open".
pub fn find_modal_trigger<'a>(elements: &'a [PageElement], modal: &PageElement) -> Option<&'a PageElement> {
    let modal_id = modal.attribute("id").filter(|id| !id.is_empty());
    let targets_modal = |value: Option<&str>| match (value, modal_id) {
        (Some(value), Some(id)) => value.strip_prefix('#').unwrap_or(value) == id,
        _ => false,
    };

    of_type(elements, ElementType::Button).find(|el| {
        targets_modal(el.attribute("data-target"))
            || targets_modal(el.attribute("aria-controls"))
            || el.text_contains("open")
    })
}

fn of_type(elements: &[PageElement], element_type: ElementType) -> impl Iterator<Item = &PageElement> {
    elements.iter().filter(move |el| el.element_type == element_type)
}
