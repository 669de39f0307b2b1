use serde::{Deserialize, Serialize};

use crate::browser::page::WaitCondition;
use crate::network::api_model::ApiCall;

// ============================================================================
// Interactions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Click,
    Fill,
    Select,
    Check,
    Press,
    Hover,
    Scroll,
}

/// A typed interaction against one target selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_for: Option<WaitCondition>,
}

impl Interaction {
    pub fn new(action_type: ActionType, element: impl Into<String>) -> Self {
        Interaction {
            action_type,
            element: element.into(),
            value: None,
            wait_for: None,
        }
    }

    pub fn click(element: impl Into<String>) -> Self {
        Self::new(ActionType::Click, element)
    }

    pub fn fill(element: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ActionType::Fill, element).with_value(value)
    }

    pub fn select(element: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(ActionType::Select, element).with_value(value)
    }

    pub fn check(element: impl Into<String>) -> Self {
        Self::new(ActionType::Check, element)
    }

    pub fn press(element: impl Into<String>, key: impl Into<String>) -> Self {
        Self::new(ActionType::Press, element).with_value(key)
    }

    pub fn scroll(element: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(ActionType::Scroll, element).with_value(to)
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn wait_for(mut self, wait: WaitCondition) -> Self {
        self.wait_for = Some(wait);
        self
    }
}

// ============================================================================
// Assertions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssertionKind {
    Visible,
    Hidden,
    Text,
    Value,
    Count,
    Url,
    Attribute,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expected {
    Bool(bool),
    Number(i64),
    Text(String),
}

/// Post-condition checked after a step's action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    #[serde(rename = "type")]
    pub kind: AssertionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    pub expected: Expected,
}

impl Assertion {
    pub fn visible(selector: impl Into<String>) -> Self {
        Assertion {
            kind: AssertionKind::Visible,
            selector: Some(selector.into()),
            expected: Expected::Bool(true),
        }
    }

    pub fn url(expected: impl Into<String>) -> Self {
        Assertion {
            kind: AssertionKind::Url,
            selector: None,
            expected: Expected::Text(expected.into()),
        }
    }
}

// ============================================================================
// Flows
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStep {
    pub id: String,
    pub action: Interaction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assertion: Option<Assertion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_regression: Option<bool>,
}

impl FlowStep {
    pub fn new(id: impl Into<String>, action: Interaction) -> Self {
        FlowStep {
            id: id.into(),
            action,
            assertion: None,
            screenshot: None,
            visual_regression: None,
        }
    }

    pub fn with_assertion(mut self, assertion: Assertion) -> Self {
        self.assertion = Some(assertion);
        self
    }

    pub fn with_screenshot(mut self, screenshot: bool) -> Self {
        self.screenshot = Some(screenshot);
        self
    }

    /// Screenshot and compare against the visual baseline.
    pub fn with_visual_regression(mut self) -> Self {
        self.screenshot = Some(true);
        self.visual_regression = Some(true);
        self
    }
}

/// A named point at which a visual snapshot is taken.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualCheckpoint {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    pub full_page: bool,
    /// Selectors masked out before comparison.
    #[serde(default)]
    pub mask: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
}

impl VisualCheckpoint {
    pub fn full_page(name: impl Into<String>) -> Self {
        VisualCheckpoint {
            name: name.into(),
            selector: None,
            full_page: true,
            mask: Vec::new(),
            threshold: None,
        }
    }

    pub fn element(name: impl Into<String>, selector: impl Into<String>) -> Self {
        VisualCheckpoint {
            name: name.into(),
            selector: Some(selector.into()),
            full_page: false,
            mask: Vec::new(),
            threshold: None,
        }
    }

    pub fn masking(mut self, selectors: &[&str]) -> Self {
        self.mask = selectors.iter().map(|s| s.to_string()).collect();
        self
    }
}

/// An inferred interaction scenario. Step order is execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFlow {
    pub name: String,
    pub description: String,
    pub steps: Vec<FlowStep>,
    #[serde(rename = "expectedAPICalls", default)]
    pub expected_api_calls: Vec<ApiCall>,
    #[serde(default)]
    pub visual_checkpoints: Vec<VisualCheckpoint>,
}

impl UserFlow {
    pub fn new(name: impl Into<String>, description: impl Into<String>, steps: Vec<FlowStep>) -> Self {
        UserFlow {
            name: name.into(),
            description: description.into(),
            steps,
            expected_api_calls: Vec::new(),
            visual_checkpoints: Vec::new(),
        }
    }

    pub fn with_api_calls(mut self, calls: Vec<ApiCall>) -> Self {
        self.expected_api_calls = calls;
        self
    }

    pub fn with_checkpoints(mut self, checkpoints: Vec<VisualCheckpoint>) -> Self {
        self.visual_checkpoints = checkpoints;
        self
    }
}
