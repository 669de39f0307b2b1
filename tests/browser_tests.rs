use std::time::Duration;

use page_insight::browser::fixture::StaticPage;
use page_insight::browser::page::{PageError, RenderedPage, WaitCondition};
use page_insight::browser::session::{BrowserRequest, RequestEnvelope, ServerLine};
use serde_json::json;

// =========================================================================
// Wire protocol
// =========================================================================

#[test]
fn navigate_request_serializes_flat_with_id() {
    let request = BrowserRequest::navigate(
        "https://x.test/",
        WaitCondition::NetworkIdle,
        Duration::from_secs(30),
    );
    let line = serde_json::to_value(RequestEnvelope { id: 7, request: &request }).unwrap();
    assert_eq!(
        line,
        json!({
            "id": 7,
            "cmd": "navigate",
            "url": "https://x.test/",
            "waitUntil": "networkidle",
            "timeoutMs": 30000
        })
    );
    assert_eq!(request.name(), "navigate");
}

#[test]
fn other_requests_serialize() {
    let screenshot = serde_json::to_value(BrowserRequest::screenshot(true)).unwrap();
    assert_eq!(screenshot, json!({"cmd": "screenshot", "fullPage": true}));

    let wait = serde_json::to_value(BrowserRequest::wait(Duration::from_millis(1500))).unwrap();
    assert_eq!(wait, json!({"cmd": "wait", "durationMs": 1500}));

    let quit = serde_json::to_value(BrowserRequest::quit()).unwrap();
    assert_eq!(quit, json!({"cmd": "quit"}));

    let eval = BrowserRequest::evaluate("document.title");
    assert_eq!(eval.name(), "evaluate");
    assert_eq!(
        serde_json::to_value(&eval).unwrap(),
        json!({"cmd": "evaluate", "script": "document.title"})
    );
}

#[test]
fn server_lines_are_told_apart() {
    match ServerLine::parse(r#"{"id":3,"ok":true,"data":"Acme"}"#).unwrap() {
        ServerLine::Reply(reply) => {
            assert_eq!(reply.id, Some(3));
            assert!(reply.ok);
            assert_eq!(reply.data, Some(json!("Acme")));
        }
        other => panic!("expected reply, got {:?}", other),
    }

    match ServerLine::parse(r#"{"ready":true,"ok":true}"#).unwrap() {
        ServerLine::Reply(reply) => {
            assert_eq!(reply.ready, Some(true));
            assert_eq!(reply.id, None);
        }
        other => panic!("expected ready line, got {:?}", other),
    }

    let event = r#"{"event":"response","url":"https://x.test/api/cart","method":"GET","status":200,"resourceType":"fetch","responseBody":"{}"}"#;
    match ServerLine::parse(event).unwrap() {
        ServerLine::Response(response) => {
            assert_eq!(response.url, "https://x.test/api/cart");
            assert_eq!(response.resource_type, "fetch");
            assert_eq!(response.request_body, None);
            assert_eq!(response.response_body.as_deref(), Some("{}"));
        }
        other => panic!("expected response event, got {:?}", other),
    }
}

#[test]
fn failed_reply_carries_error() {
    match ServerLine::parse(r#"{"id":1,"ok":false,"error":"net::ERR_ABORTED"}"#).unwrap() {
        ServerLine::Reply(reply) => {
            assert!(!reply.ok);
            assert_eq!(reply.error.as_deref(), Some("net::ERR_ABORTED"));
        }
        other => panic!("expected reply, got {:?}", other),
    }
}

#[test]
fn garbage_lines_are_json_errors() {
    assert!(matches!(ServerLine::parse("not json"), Err(PageError::Json { .. })));
    assert!(matches!(
        ServerLine::parse(r#"{"event":"response","url":"x"}"#),
        Err(PageError::Json { .. })
    ));
}

#[test]
fn wait_conditions_use_driver_strings() {
    assert_eq!(serde_json::to_value(WaitCondition::DomContentLoaded).unwrap(), json!("domcontentloaded"));
    let parsed: WaitCondition = serde_json::from_value(json!("networkidle")).unwrap();
    assert_eq!(parsed, WaitCondition::NetworkIdle);
    assert_eq!(WaitCondition::Load.to_string(), "load");
    assert_eq!(WaitCondition::FALLBACK_ORDER[0], WaitCondition::NetworkIdle);
}

// =========================================================================
// Static page
// =========================================================================

#[test]
fn static_page_title_prefers_override() {
    let mut page = StaticPage::new("<title> Saved </title><p>x</p>");
    assert_eq!(page.title().unwrap(), "Saved");

    let mut page = StaticPage::new("<p>x</p>").with_title("Given");
    assert_eq!(page.title().unwrap(), "Given");
}

#[test]
fn static_page_scroll_heights_repeat_last() {
    let mut page = StaticPage::new("").with_scroll_heights([800, 1600]);
    assert_eq!(page.scroll_height().unwrap(), 800);
    page.scroll_to_bottom().unwrap();
    assert_eq!(page.scroll_height().unwrap(), 1600);
    assert_eq!(page.scroll_height().unwrap(), 1600);
    assert_eq!(page.scroll_count(), 1);
}

#[test]
fn static_page_cannot_evaluate() {
    let mut page = StaticPage::new("<p>x</p>");
    assert!(matches!(page.evaluate("1 + 1"), Err(PageError::Script(_))));
}

#[test]
fn closed_static_page_rejects_commands() {
    let mut page = StaticPage::new("<p>x</p>").with_screenshot(vec![1, 2, 3]);
    assert_eq!(page.screenshot(false).unwrap(), vec![1, 2, 3]);

    page.close().unwrap();
    assert!(page.is_closed());
    assert!(matches!(page.snapshot(), Err(PageError::Closed)));
    assert!(matches!(page.title(), Err(PageError::Closed)));
    assert!(matches!(
        page.navigate("https://x.test/", WaitCondition::Load, Duration::from_secs(1)),
        Err(PageError::Closed)
    ));
    assert!(page.navigation_attempts().is_empty());
}

#[test]
fn page_errors_read_well() {
    let err = PageError::Timeout {
        command: "navigate".into(),
        timeout_ms: 30_000,
    };
    assert_eq!(err.to_string(), "Timeout 30000ms exceeded while waiting for navigate");
    assert_eq!(PageError::Closed.to_string(), "Page is closed");
}
