use serde_json::{Map, Value, json};

use crate::network::api_model::ApiCall;

/// Body to serve when mocking `call`: an explicit mock, else the recorded
/// response, else a default shaped after the URL.
pub fn mock_response(call: &ApiCall) -> Value {
    if let Some(mock) = &call.mock_response {
        return mock.clone();
    }
    if let Some(body) = &call.response_body {
        return body.clone();
    }

    let url = call.url.as_str();
    if url.contains("user") || url.contains("profile") {
        json!({ "id": 1, "name": "Test User", "email": "test@example.com" })
    } else if url.contains("product") {
        json!({ "id": 1, "name": "Test Product", "price": 99.99, "inStock": true })
    } else if url.contains("cart") {
        json!({ "items": [], "total": 0 })
    } else {
        json!({ "success": true })
    }
}

/// Last non-empty path segment of `url`, or `default`.
pub fn fixture_key(url: &str) -> String {
    url.split('/')
        .filter(|segment| !segment.is_empty())
        .last()
        .unwrap_or("default")
        .to_string()
}

/// Fixture map keyed by [`fixture_key`]. Later calls overwrite earlier ones
/// sharing a key.
pub fn fixtures(calls: &[ApiCall]) -> Map<String, Value> {
    let mut fixtures = Map::new();
    for call in calls {
        fixtures.insert(fixture_key(&call.url), mock_response(call));
    }
    fixtures
}
