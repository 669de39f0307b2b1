use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded API exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCall {
    pub method: String,
    pub url: String,
    /// Absent when the body was missing or not JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
    pub status: u16,
    /// Caller-supplied override used instead of the recorded body when mocking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_response: Option<Value>,
}

impl ApiCall {
    pub fn url_contains_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.url.contains(n))
    }
}

/// Calls whose URL contains any of `needles`, in recorded order.
pub fn calls_matching(calls: &[ApiCall], needles: &[&str]) -> Vec<ApiCall> {
    calls
        .iter()
        .filter(|c| c.url_contains_any(needles))
        .cloned()
        .collect()
}
