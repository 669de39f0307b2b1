use std::time::Duration;

use crate::browser::page::PageError;
use crate::extract::navigation::NavigationError;

/// Failures that escape the analysis core. Everything else is absorbed where
/// it happens (skipped selector, skipped detector, absent body).
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Navigation(#[from] NavigationError),

    #[error(transparent)]
    Page(#[from] PageError),

    #[error("Analysis exceeded its {}s budget during {phase}", .limit.as_secs())]
    Timeout { phase: String, limit: Duration },
}
