mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::fixtures::{LANDING_PAGE, LOGIN_PAGE, extract, xhr};
use page_insight::analysis::analysis_model::PageAnalysis;
use page_insight::analysis::error::AnalysisError;
use page_insight::analysis::session::{AnalysisOptions, analyze_page, detect_interactions};
use page_insight::browser::fixture::StaticPage;
use page_insight::browser::page::{PageError, WaitCondition};
use page_insight::extract::navigation::NavigationError;
use page_insight::flow::live::{LiveDetectionConfig, detect_user_flows};
use page_insight::flow::pattern::analyze_patterns;

const URL: &str = "https://app.example.test/login";

fn live_options() -> AnalysisOptions {
    AnalysisOptions {
        live_detection: true,
        ..AnalysisOptions::default()
    }
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn pattern_and_live_flows_coexist() {
    let mut page = StaticPage::new(LOGIN_PAGE)
        .with_response(xhr("https://app.example.test/api/auth/csrf", r#"{"token":"t"}"#));

    let analysis = analyze_page(&mut page, URL, &live_options()).unwrap();

    let form = analysis
        .user_flows
        .iter()
        .find(|f| f.name == "Form Submission - login_form")
        .unwrap();
    assert_eq!(form.steps.len(), 3);

    let login = analysis.user_flows.iter().find(|f| f.name == "Login Flow").unwrap();
    assert_eq!(login.steps.len(), 3);
    assert_eq!(login.visual_checkpoints.len(), 2);
    assert_eq!(login.expected_api_calls.len(), 1);

    let pattern_flows = analysis
        .user_flows
        .iter()
        .filter(|f| f.name.starts_with("Form Submission - "))
        .count();
    assert_eq!(pattern_flows, 1);
    assert_eq!(analysis.user_flows[0].name, "Form Submission - login_form");

    assert_eq!(analysis.api_routes.len(), 1);
    assert_eq!(analysis.api_routes[0].url, "https://app.example.test/api/auth/csrf");
    assert_eq!(analysis.title, "Sign in");
    assert!(page.is_closed());
}

#[test]
fn flows_list_pattern_flows_then_live_flows() {
    let mut page = StaticPage::new(LANDING_PAGE);
    let analysis = analyze_page(&mut page, URL, &live_options()).unwrap();

    let mut expected: Vec<String> = analyze_patterns(&extract(LANDING_PAGE))
        .into_iter()
        .map(|f| f.name)
        .collect();
    let mut live_page = StaticPage::new(LANDING_PAGE);
    expected.extend(
        detect_user_flows(&mut live_page, &[], &LiveDetectionConfig::default())
            .into_iter()
            .map(|f| f.name),
    );

    let names: Vec<String> = analysis.user_flows.iter().map(|f| f.name.clone()).collect();
    assert!(!expected.is_empty());
    assert_eq!(names, expected);
}

#[test]
fn live_detection_is_opt_in() {
    let mut page = StaticPage::new(LOGIN_PAGE);
    let analysis = analyze_page(&mut page, URL, &AnalysisOptions::default()).unwrap();
    let names: Vec<&str> = analysis.user_flows.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Form Submission - login_form"]);
}

#[test]
fn pattern_flows_can_be_disabled() {
    let options = AnalysisOptions {
        pattern_flows: false,
        ..AnalysisOptions::default()
    };
    let mut page = StaticPage::new(LOGIN_PAGE);
    let analysis = analyze_page(&mut page, URL, &options).unwrap();
    assert!(analysis.user_flows.is_empty());
    assert!(!analysis.elements.is_empty());
}

#[test]
fn analysis_round_trips_through_json() {
    let mut page = StaticPage::new(LANDING_PAGE);
    let analysis = analyze_page(&mut page, "https://shop.test/", &live_options()).unwrap();

    let json = serde_json::to_value(&analysis).unwrap();
    assert!(json.get("interactiveElements").is_some());
    assert!(json.get("userFlows").is_some());
    assert!(json.get("apiRoutes").is_some());
    assert!(json["metadata"].get("totalElements").is_some());
    assert!(json["elements"][0].get("uniqueName").is_some());
    assert!(json["userFlows"][0].get("expectedAPICalls").is_some());

    let back: PageAnalysis = serde_json::from_value(json).unwrap();
    assert_eq!(back, analysis);
}

// ============================================================================
// Failure handling and cleanup
// ============================================================================

#[test]
fn page_is_closed_when_navigation_fails() {
    let mut page = WaitCondition::FALLBACK_ORDER.iter().fold(
        StaticPage::new(LOGIN_PAGE),
        |page, wait| page.fail_navigation(*wait, "net::ERR_CONNECTION_REFUSED"),
    );
    let closed = page.closed_flag();

    let err = analyze_page(&mut page, URL, &live_options()).unwrap_err();
    assert!(matches!(err, AnalysisError::Navigation(NavigationError::Network(_))));
    assert!(closed.load(Ordering::SeqCst));
    assert_eq!(page.navigation_attempts().len(), 3);
}

#[test]
fn page_is_closed_when_extraction_fails() {
    let mut page = StaticPage::new(LOGIN_PAGE).fail_snapshot("Target page, context or browser has been closed");
    let err = analyze_page(&mut page, URL, &AnalysisOptions::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::Page(PageError::Script(_))));
    assert!(page.is_closed());
}

#[test]
fn network_idle_timeout_falls_back_silently() {
    let mut page = StaticPage::new(LOGIN_PAGE)
        .fail_navigation(WaitCondition::NetworkIdle, "Timeout 30000ms exceeded.");
    let analysis = analyze_page(&mut page, URL, &AnalysisOptions::default()).unwrap();
    assert_eq!(analysis.user_flows.len(), 1);
    assert_eq!(
        page.navigation_attempts(),
        &[WaitCondition::NetworkIdle, WaitCondition::DomContentLoaded]
    );
}

#[test]
fn overall_budget_is_enforced() {
    let options = AnalysisOptions {
        overall_timeout: Duration::ZERO,
        ..AnalysisOptions::default()
    };
    let mut page = StaticPage::new(LOGIN_PAGE);
    let err = analyze_page(&mut page, URL, &options).unwrap_err();
    match err {
        AnalysisError::Timeout { phase, limit } => {
            assert_eq!(phase, "extraction");
            assert_eq!(limit, Duration::ZERO);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    assert!(page.is_closed());
}

// ============================================================================
// Detection only
// ============================================================================

#[test]
fn detect_interactions_returns_live_flows_only() {
    let mut page = StaticPage::new(LOGIN_PAGE);
    let flows = detect_interactions(&mut page, URL, &AnalysisOptions::default()).unwrap();
    let names: Vec<&str> = flows.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Login Flow", "Form Submission Flow"]);
    assert!(page.is_closed());
}
