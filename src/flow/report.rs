use crate::flow::flow_model::UserFlow;

// ============================================================================
// Interaction report, Markdown
// ============================================================================

/// Summarize inferred flows.
///
/// Produces output like:
/// ```text
/// # Interaction Analysis Report
///
/// ## Total Patterns Found: 1
///
/// ### Login Flow
/// User login with email and password
///
/// **Steps:** 3
/// **API Calls:** 1
/// **Visual Checkpoints:** 2
/// ```
pub fn interaction_report(flows: &[UserFlow]) -> String {
    let mut out = String::from("# Interaction Analysis Report\n\n");
    out.push_str(&format!("## Total Patterns Found: {}\n", flows.len()));

    for flow in flows {
        out.push_str(&format!("\n### {}\n{}\n\n", flow.name, flow.description));
        out.push_str(&format!("**Steps:** {}\n", flow.steps.len()));
        out.push_str(&format!("**API Calls:** {}\n", flow.expected_api_calls.len()));
        out.push_str(&format!(
            "**Visual Checkpoints:** {}\n",
            flow.visual_checkpoints.len()
        ));
    }

    out
}
