use scraper::ElementRef;

use crate::browser::page::{PageError, WaitCondition};
use crate::dom::snapshot::{attr, tag_name};
use crate::flow::flow_model::{Assertion, FlowStep, Interaction, UserFlow, VisualCheckpoint};
use crate::flow::live::{DetectionContext, Probe, Query, find_all, find_first, find_within, step_selector};
use crate::flow::values;

const MODAL_REGION: &str = "[role=\"dialog\"], .modal";
const CHROME: [&str; 2] = ["header", "footer"];

/// The interaction archetypes probed on a live page, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detector {
    Login,
    Search,
    Form,
    Navigation,
    Cart,
    Filter,
    Modal,
    Accordion,
    Tabs,
    InfiniteScroll,
}

impl Detector {
    pub const ALL: [Detector; 10] = [
        Detector::Login,
        Detector::Search,
        Detector::Form,
        Detector::Navigation,
        Detector::Cart,
        Detector::Filter,
        Detector::Modal,
        Detector::Accordion,
        Detector::Tabs,
        Detector::InfiniteScroll,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Detector::Login => "login",
            Detector::Search => "search",
            Detector::Form => "form",
            Detector::Navigation => "navigation",
            Detector::Cart => "cart",
            Detector::Filter => "filter",
            Detector::Modal => "modal",
            Detector::Accordion => "accordion",
            Detector::Tabs => "tabs",
            Detector::InfiniteScroll => "infinite_scroll",
        }
    }

    /// `Ok(None)` when the archetype is not present on the page.
    pub fn detect(&self, probe: &mut Probe<'_>, ctx: &DetectionContext<'_>) -> Result<Option<UserFlow>, PageError> {
        match self {
            Detector::Login => detect_login(probe, ctx),
            Detector::Search => detect_search(probe, ctx),
            Detector::Form => detect_form(probe, ctx),
            Detector::Navigation => detect_navigation(probe),
            Detector::Cart => detect_cart(probe, ctx),
            Detector::Filter => detect_filter(probe, ctx),
            Detector::Modal => detect_modal(probe),
            Detector::Accordion => detect_accordion(probe),
            Detector::Tabs => detect_tabs(probe),
            Detector::InfiniteScroll => detect_infinite_scroll(probe, ctx),
        }
    }
}

/// Sequential `step_N` ids, starting at 1.
struct StepIds(usize);

impl StepIds {
    fn new() -> Self {
        StepIds(0)
    }

    fn next(&mut self) -> String {
        self.0 += 1;
        format!("step_{}", self.0)
    }
}

// ============================================================================
// Login
// ============================================================================

const LOGIN_SIGNALS: [Query; 8] = [
    Query::Css("input[type=\"email\"]"),
    Query::Css("input[type=\"password\"]"),
    Query::Css("input[name*=\"email\"]"),
    Query::Css("input[name*=\"username\"]"),
    Query::Css("input[name*=\"password\"]"),
    Query::Css("button[type=\"submit\"]"),
    Query::ButtonText("Login"),
    Query::ButtonText("Sign in"),
];

const LOGIN_IDENTITY: [Query; 3] = [
    Query::Css("input[type=\"email\"]"),
    Query::Css("input[name*=\"email\"]"),
    Query::Css("input[name*=\"username\"]"),
];

const LOGIN_SUBMIT: [Query; 3] = [
    Query::Css("button[type=\"submit\"]"),
    Query::ButtonText("Login"),
    Query::ButtonText("Sign in"),
];

fn detect_login(probe: &mut Probe<'_>, ctx: &DetectionContext<'_>) -> Result<Option<UserFlow>, PageError> {
    let document = probe.document()?;
    if find_all(document, &LOGIN_SIGNALS).len() < 2 {
        return Ok(None);
    }

    let mut ids = StepIds::new();
    let mut steps = Vec::new();

    if let Some(identity) = find_first(document, &LOGIN_IDENTITY) {
        steps.push(
            FlowStep::new(ids.next(), Interaction::fill(step_selector(identity), values::LOGIN_EMAIL))
                .with_screenshot(false),
        );
    }
    if let Some(password) = find_first(document, &[Query::Css("input[type=\"password\"]")]) {
        steps.push(
            FlowStep::new(ids.next(), Interaction::fill(step_selector(password), values::LOGIN_PASSWORD))
                .with_screenshot(false),
        );
    }
    if let Some(submit) = find_first(document, &LOGIN_SUBMIT) {
        steps.push(
            FlowStep::new(
                ids.next(),
                Interaction::click(step_selector(submit)).wait_for(WaitCondition::NetworkIdle),
            )
            .with_visual_regression()
            .with_assertion(Assertion::url("/dashboard")),
        );
    }

    if steps.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        UserFlow::new("Login Flow", "User login with email and password", steps)
            .with_api_calls(ctx.calls_matching(&["login", "auth"]))
            .with_checkpoints(vec![
                VisualCheckpoint::full_page("login-page-initial"),
                VisualCheckpoint::full_page("dashboard-after-login").masking(&CHROME),
            ]),
    ))
}

// ============================================================================
// Search
// ============================================================================

const SEARCH_INPUTS: [Query; 5] = [
    Query::Css("input[type=\"search\"]"),
    Query::Css("input[placeholder*=\"Search\" i]"),
    Query::Css("input[aria-label*=\"Search\" i]"),
    Query::Css("input[name*=\"search\" i]"),
    Query::Css("[role=\"search\"] input"),
];

fn detect_search(probe: &mut Probe<'_>, ctx: &DetectionContext<'_>) -> Result<Option<UserFlow>, PageError> {
    let Some(input) = find_first(probe.document()?, &SEARCH_INPUTS) else {
        return Ok(None);
    };
    let selector = step_selector(input);

    let steps = vec![
        FlowStep::new("step_1", Interaction::fill(&selector, values::SEARCH_QUERY)).with_screenshot(false),
        FlowStep::new(
            "step_2",
            Interaction::press(&selector, "Enter").wait_for(WaitCondition::NetworkIdle),
        )
        .with_visual_regression(),
    ];

    Ok(Some(
        UserFlow::new("Search Flow", "User performs a search query", steps)
            .with_api_calls(ctx.calls_matching(&["search", "query"]))
            .with_checkpoints(vec![VisualCheckpoint::full_page("search-results")]),
    ))
}

// ============================================================================
// Generic form
// ============================================================================

const FORM_FIELDS: [Query; 3] = [Query::Css("input"), Query::Css("select"), Query::Css("textarea")];
const FORM_SUBMIT: [Query; 2] = [
    Query::Css("button[type=\"submit\"]"),
    Query::Css("input[type=\"submit\"]"),
];

fn detect_form(probe: &mut Probe<'_>, ctx: &DetectionContext<'_>) -> Result<Option<UserFlow>, PageError> {
    let Some(form) = find_first(probe.document()?, &[Query::Css("form")]) else {
        return Ok(None);
    };

    let mut ids = StepIds::new();
    let mut steps = Vec::new();

    for field in find_within(form, &FORM_FIELDS) {
        if let Some(action) = form_field_action(field) {
            steps.push(FlowStep::new(ids.next(), action).with_screenshot(false));
        }
    }

    if let Some(submit) = find_within(form, &FORM_SUBMIT).into_iter().next() {
        steps.push(
            FlowStep::new(
                ids.next(),
                Interaction::click(step_selector(submit)).wait_for(WaitCondition::NetworkIdle),
            )
            .with_visual_regression(),
        );
    }

    if steps.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        UserFlow::new("Form Submission Flow", "User fills and submits a form", steps)
            .with_api_calls(ctx.all_calls())
            .with_checkpoints(vec![VisualCheckpoint::element("form-filled", "form")]),
    ))
}

/// What to do with one form field. Inputs without a `type` are text inputs.
fn form_field_action(field: ElementRef<'_>) -> Option<Interaction> {
    let selector = step_selector(field);
    match tag_name(field).as_str() {
        "input" => {
            let input_type = attr(field, "type")
                .map(str::to_ascii_lowercase)
                .unwrap_or_else(|| "text".to_string());
            match input_type.as_str() {
                "email" => Some(Interaction::fill(selector, values::EMAIL)),
                "text" | "tel" => Some(Interaction::fill(selector, values::FORM_TEXT)),
                "checkbox" | "radio" => Some(Interaction::check(selector)),
                _ => None,
            }
        }
        "select" => Some(Interaction::select(selector, values::SELECT_OPTION)),
        "textarea" => Some(Interaction::fill(selector, values::FORM_MESSAGE)),
        _ => None,
    }
}

// ============================================================================
// Navigation
// ============================================================================

fn detect_navigation(probe: &mut Probe<'_>) -> Result<Option<UserFlow>, PageError> {
    let links = find_all(probe.document()?, &[Query::Css("nav a"), Query::Css("header a")]);
    if links.is_empty() {
        return Ok(None);
    }

    let steps: Vec<FlowStep> = links
        .into_iter()
        .take(3)
        .enumerate()
        .map(|(idx, link)| {
            FlowStep::new(
                format!("step_{}", idx + 1),
                Interaction::click(step_selector(link)).wait_for(WaitCondition::NetworkIdle),
            )
            .with_visual_regression()
            .with_assertion(Assertion::visible("main, [role=\"main\"]"))
        })
        .collect();

    let checkpoints = (1..=steps.len())
        .map(|n| VisualCheckpoint::full_page(format!("nav-page-{n}")).masking(&CHROME))
        .collect();

    Ok(Some(
        UserFlow::new("Navigation Flow", "User navigates through main menu items", steps)
            .with_checkpoints(checkpoints),
    ))
}

// ============================================================================
// Cart
// ============================================================================

const ADD_TO_CART: [Query; 4] = [
    Query::ButtonText("Add to Cart"),
    Query::ButtonText("Add to Bag"),
    Query::Css("button[aria-label*=\"Add to cart\" i]"),
    Query::Css(".add-to-cart"),
];

const CART_ICON: [Query; 2] = [
    Query::Css("[aria-label*=\"cart\" i]"),
    Query::Css("[data-testid*=\"cart\"]"),
];

fn detect_cart(probe: &mut Probe<'_>, ctx: &DetectionContext<'_>) -> Result<Option<UserFlow>, PageError> {
    let document = probe.document()?;
    let Some(add_button) = find_first(document, &ADD_TO_CART) else {
        return Ok(None);
    };

    let mut steps = vec![
        FlowStep::new(
            "step_1",
            Interaction::click(step_selector(add_button)).wait_for(WaitCondition::NetworkIdle),
        )
        .with_visual_regression(),
    ];
    if let Some(icon) = find_first(document, &CART_ICON) {
        steps.push(FlowStep::new("step_2", Interaction::click(step_selector(icon))).with_visual_regression());
    }

    Ok(Some(
        UserFlow::new("Add to Cart Flow", "User adds item to shopping cart", steps)
            .with_api_calls(ctx.calls_matching(&["cart", "basket"]))
            .with_checkpoints(vec![
                VisualCheckpoint::element("product-added", ".cart-notification, .toast"),
                VisualCheckpoint::full_page("cart-page"),
            ]),
    ))
}

// ============================================================================
// Filter
// ============================================================================

const FILTER_CONTROLS: [Query; 4] = [
    Query::Css("input[type=\"checkbox\"]"),
    Query::Css("select"),
    Query::Css("[role=\"checkbox\"]"),
    Query::Css(".filter"),
];

fn detect_filter(probe: &mut Probe<'_>, ctx: &DetectionContext<'_>) -> Result<Option<UserFlow>, PageError> {
    let controls = find_all(probe.document()?, &FILTER_CONTROLS);

    // Ids follow the control's position, so a skipped control leaves a gap.
    let steps: Vec<FlowStep> = controls
        .into_iter()
        .take(2)
        .enumerate()
        .filter_map(|(idx, control)| {
            let selector = step_selector(control);
            let action = match tag_name(control).as_str() {
                "input" => Interaction::check(selector),
                "select" => Interaction::select(selector, values::SELECT_OPTION),
                _ => return None,
            };
            Some(
                FlowStep::new(format!("step_{}", idx + 1), action.wait_for(WaitCondition::NetworkIdle))
                    .with_screenshot(true),
            )
        })
        .collect();

    if steps.is_empty() {
        return Ok(None);
    }

    Ok(Some(
        UserFlow::new("Filter Flow", "User applies filters to refine results", steps)
            .with_api_calls(ctx.all_calls())
            .with_checkpoints(vec![VisualCheckpoint::full_page("filtered-results")]),
    ))
}

// ============================================================================
// Modal, accordion, tabs
// ============================================================================

const MODAL_TRIGGERS: [Query; 3] = [
    Query::Css("[data-modal]"),
    Query::Css("[data-toggle=\"modal\"]"),
    Query::ButtonText("Open"),
];

fn detect_modal(probe: &mut Probe<'_>) -> Result<Option<UserFlow>, PageError> {
    let Some(trigger) = find_first(probe.document()?, &MODAL_TRIGGERS) else {
        return Ok(None);
    };

    let step = FlowStep::new("step_1", Interaction::click(step_selector(trigger)))
        .with_visual_regression()
        .with_assertion(Assertion::visible(MODAL_REGION));

    Ok(Some(
        UserFlow::new("Modal Interaction Flow", "User opens and interacts with modal dialog", vec![step])
            .with_checkpoints(vec![VisualCheckpoint::element("modal-open", MODAL_REGION)]),
    ))
}

fn detect_accordion(probe: &mut Probe<'_>) -> Result<Option<UserFlow>, PageError> {
    let items = find_all(probe.document()?, &[Query::Css("[role=\"button\"][aria-expanded]")]);
    if items.is_empty() {
        return Ok(None);
    }

    let steps = items
        .into_iter()
        .take(2)
        .enumerate()
        .map(|(idx, item)| {
            FlowStep::new(format!("step_{}", idx + 1), Interaction::click(step_selector(item)))
                .with_screenshot(true)
        })
        .collect();

    Ok(Some(
        UserFlow::new("Accordion Expansion Flow", "User expands accordion sections", steps)
            .with_checkpoints(vec![VisualCheckpoint::element("accordion-expanded", "[role=\"region\"]")]),
    ))
}

fn detect_tabs(probe: &mut Probe<'_>) -> Result<Option<UserFlow>, PageError> {
    let tabs = find_all(probe.document()?, &[Query::Css("[role=\"tab\"]")]);
    if tabs.is_empty() {
        return Ok(None);
    }

    let steps: Vec<FlowStep> = tabs
        .into_iter()
        .take(3)
        .enumerate()
        .map(|(idx, tab)| {
            FlowStep::new(format!("step_{}", idx + 1), Interaction::click(step_selector(tab)))
                .with_visual_regression()
        })
        .collect();

    let checkpoints = (1..=steps.len())
        .map(|n| VisualCheckpoint::element(format!("tab-{n}"), "[role=\"tabpanel\"]"))
        .collect();

    Ok(Some(
        UserFlow::new("Tab Navigation Flow", "User switches between tabs", steps).with_checkpoints(checkpoints),
    ))
}

// ============================================================================
// Infinite scroll
// ============================================================================

/// Scrolls the page, so it runs last.
fn detect_infinite_scroll(probe: &mut Probe<'_>, ctx: &DetectionContext<'_>) -> Result<Option<UserFlow>, PageError> {
    let page = probe.page();
    let initial_height = page.scroll_height()?;
    page.scroll_to_bottom()?;
    page.wait_for_timeout(ctx.config.scroll_settle)?;
    let new_height = page.scroll_height()?;

    if new_height <= initial_height {
        return Ok(None);
    }

    let step = FlowStep::new(
        "step_1",
        Interaction::scroll("body", "bottom").wait_for(WaitCondition::NetworkIdle),
    )
    .with_screenshot(true);

    Ok(Some(
        UserFlow::new("Infinite Scroll Flow", "User scrolls to load more content", vec![step])
            .with_api_calls(ctx.all_calls())
            .with_checkpoints(vec![VisualCheckpoint::full_page("scrolled-content")]),
    ))
}
