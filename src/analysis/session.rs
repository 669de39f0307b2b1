use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::analysis::analysis_model::PageAnalysis;
use crate::analysis::error::AnalysisError;
use crate::browser::page::RenderedPage;
use crate::extract::extractor::{ExtractorConfig, PageExtractor};
use crate::extract::navigation::navigate_with_fallback;
use crate::flow::flow_model::UserFlow;
use crate::flow::live::{LiveDetectionConfig, detect_user_flows};
use crate::flow::pattern::analyze_patterns;
use crate::network::recorder::ApiRecorder;

#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    pub extractor: ExtractorConfig,
    /// Budget for the whole request, checked between phases.
    pub overall_timeout: Duration,
    pub pattern_flows: bool,
    pub live_detection: bool,
    pub live: LiveDetectionConfig,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            extractor: ExtractorConfig::default(),
            overall_timeout: Duration::from_secs(60),
            pattern_flows: true,
            live_detection: false,
            live: LiveDetectionConfig::default(),
        }
    }
}

struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    fn start(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    fn check(&self, phase: &str) -> Result<(), AnalysisError> {
        if self.started.elapsed() > self.limit {
            return Err(AnalysisError::Timeout {
                phase: phase.to_string(),
                limit: self.limit,
            });
        }
        Ok(())
    }
}

/// Analyze `url` on `page`: record API traffic, extract, then infer flows.
///
/// The page is closed before returning, whatever the outcome.
pub fn analyze_page(
    page: &mut dyn RenderedPage,
    url: &str,
    options: &AnalysisOptions,
) -> Result<PageAnalysis, AnalysisError> {
    let result = run_analysis(page, url, options);
    close_page(page);
    result
}

fn run_analysis(
    page: &mut dyn RenderedPage,
    url: &str,
    options: &AnalysisOptions,
) -> Result<PageAnalysis, AnalysisError> {
    let deadline = Deadline::start(options.overall_timeout);

    let recorder = ApiRecorder::new();
    recorder.attach(page);

    let extractor = PageExtractor::new(options.extractor.clone());
    let mut analysis = extractor.analyze(page, url)?;
    deadline.check("extraction")?;

    let mut flows = Vec::new();
    if options.pattern_flows {
        let inferred = analyze_patterns(&analysis);
        info!(count = inferred.len(), "pattern flows inferred");
        flows.extend(inferred);
    }

    if options.live_detection {
        flows.extend(detect_user_flows(page, &recorder.calls(), &options.live));
        deadline.check("live flow detection")?;
    }

    analysis.append_flows(flows);
    analysis.append_api_calls(recorder.calls());
    info!(
        url,
        flows = analysis.user_flows.len(),
        api_calls = analysis.api_routes.len(),
        "analysis complete"
    );
    Ok(analysis)
}

/// Navigate and run live detection only, without building a page analysis.
///
/// The page is closed before returning, whatever the outcome.
pub fn detect_interactions(
    page: &mut dyn RenderedPage,
    url: &str,
    options: &AnalysisOptions,
) -> Result<Vec<UserFlow>, AnalysisError> {
    let result = run_detection(page, url, options);
    close_page(page);
    result
}

fn run_detection(
    page: &mut dyn RenderedPage,
    url: &str,
    options: &AnalysisOptions,
) -> Result<Vec<UserFlow>, AnalysisError> {
    let deadline = Deadline::start(options.overall_timeout);

    let recorder = ApiRecorder::new();
    recorder.attach(page);

    let wait = navigate_with_fallback(page, url, options.extractor.navigation_timeout)?;
    info!(url, %wait, "page loaded");
    page.wait_for_timeout(options.extractor.settle_delay)?;
    deadline.check("navigation")?;

    let flows = detect_user_flows(page, &recorder.calls(), &options.live);
    deadline.check("live flow detection")?;
    Ok(flows)
}

fn close_page(page: &mut dyn RenderedPage) {
    if let Err(e) = page.close() {
        warn!("failed to close page: {}", e);
    }
}
