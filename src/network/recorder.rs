use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::debug;

use crate::browser::page::{NetworkResponse, RenderedPage};
use crate::network::api_model::ApiCall;

/// Accumulates API calls observed on a page.
///
/// Clones share the same buffer: the listener attached to the page appends
/// from the driver's thread while the owner reads snapshots whenever it
/// likes. Order is arrival order.
#[derive(Debug, Clone, Default)]
pub struct ApiRecorder {
    calls: Arc<Mutex<Vec<ApiCall>>>,
}

impl ApiRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording responses from `page`. Attach before navigating.
    pub fn attach(&self, page: &mut dyn RenderedPage) {
        let recorder = self.clone();
        page.on_response(Box::new(move |response: &NetworkResponse| {
            recorder.record(response);
        }));
    }

    /// Record `response` if it looks like an API call. Returns whether it was
    /// kept.
    pub fn record(&self, response: &NetworkResponse) -> bool {
        if !is_api_response(response) {
            return false;
        }

        let call = ApiCall {
            method: response.method.to_uppercase(),
            url: response.url.clone(),
            request_body: parse_body(response.request_body.as_deref()),
            response_body: parse_body(response.response_body.as_deref()),
            status: response.status,
            mock_response: None,
        };
        debug!(method = %call.method, url = %call.url, status = call.status, "recorded API call");
        self.lock().push(call);
        true
    }

    /// Everything recorded so far.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ApiCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// XHR/fetch traffic, or anything addressed to an `/api/` or `/graphql`
/// endpoint.
pub fn is_api_response(response: &NetworkResponse) -> bool {
    matches!(response.resource_type.as_str(), "fetch" | "xhr")
        || response.url.contains("/api/")
        || response.url.contains("/graphql")
}

/// Best-effort JSON parse; anything unparseable is simply absent.
pub fn parse_body(body: Option<&str>) -> Option<Value> {
    let body = body?.trim();
    if body.is_empty() {
        return None;
    }
    serde_json::from_str::<Value>(body).ok()
}
