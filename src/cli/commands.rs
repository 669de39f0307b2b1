use tracing::info;

use crate::analysis::analysis_model::PageAnalysis;
use crate::analysis::session::{AnalysisOptions, analyze_page, detect_interactions};
use crate::browser::fixture::StaticPage;
use crate::browser::page::RenderedPage;
use crate::browser::session::BrowserSession;
use crate::cli::config::BrowserConfig;
use crate::flow::report::interaction_report;

// ============================================================================
// analyze subcommand
// ============================================================================

pub fn cmd_analyze(
    url: &str,
    html: Option<&str>,
    output: Option<&str>,
    options: &AnalysisOptions,
    browser: &BrowserConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut page = open_page(html, browser)?;
    info!(url, live = options.live_detection, patterns = options.pattern_flows, "analyzing page");

    let analysis = analyze_page(page.as_mut(), url, options)?;
    let json = serde_json::to_string_pretty(&analysis)?;
    write_output(output, &json)?;

    info!(
        elements = analysis.metadata.total_elements,
        flows = analysis.user_flows.len(),
        "analysis written"
    );
    Ok(())
}

// ============================================================================
// detect subcommand
// ============================================================================

pub fn cmd_detect(
    url: &str,
    html: Option<&str>,
    options: &AnalysisOptions,
    browser: &BrowserConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut page = open_page(html, browser)?;
    let flows = detect_interactions(page.as_mut(), url, options)?;
    println!("{}", serde_json::to_string_pretty(&flows)?);
    Ok(())
}

// ============================================================================
// report subcommand
// ============================================================================

pub fn cmd_report(analysis_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(analysis_path)?;
    let analysis: PageAnalysis = serde_json::from_str(&content)?;
    print!("{}", interaction_report(&analysis.user_flows));
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// A browser page, or a static page over a local HTML file when `html` is
/// given.
fn open_page(
    html: Option<&str>,
    browser: &BrowserConfig,
) -> Result<Box<dyn RenderedPage>, Box<dyn std::error::Error>> {
    match html {
        Some(path) => {
            let markup = std::fs::read_to_string(path)?;
            Ok(Box::new(StaticPage::new(markup)))
        }
        None => Ok(Box::new(BrowserSession::launch(&browser.session_config())?)),
    }
}

fn write_output(output: Option<&str>, content: &str) -> std::io::Result<()> {
    match output {
        Some(path) => std::fs::write(path, content),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}
