use std::time::Duration;

use tracing::{debug, warn};

use crate::browser::page::{PageError, RenderedPage, WaitCondition};

/// Raised once every wait condition has failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error(
        "HTTP/2 protocol error: The website may be blocking automated browsers. \
         Try accessing the page manually first, or use a different URL."
    )]
    ProtocolBlocked,

    #[error("Network error: {0}. Please check if the URL is accessible and try again.")]
    Network(String),

    #[error(
        "Page load timeout: The page took too long to load. \
         Try a simpler page or check your internet connection."
    )]
    Timeout,

    #[error("Navigation failed: {0}")]
    Failed(String),
}

impl NavigationError {
    /// Sort the last underlying failure into an actionable category.
    pub fn classify(last: &PageError) -> Self {
        let message = last.to_string();
        if message.contains("ERR_HTTP2_PROTOCOL_ERROR") {
            NavigationError::ProtocolBlocked
        } else if message.contains("net::ERR_") {
            NavigationError::Network(message)
        } else if message.contains("Timeout") {
            NavigationError::Timeout
        } else {
            NavigationError::Failed(message)
        }
    }
}

/// Navigate to `url`, relaxing the wait condition after each failure.
///
/// Returns the condition that succeeded.
pub fn navigate_with_fallback(
    page: &mut dyn RenderedPage,
    url: &str,
    timeout: Duration,
) -> Result<WaitCondition, NavigationError> {
    let mut last_error = None;

    for wait in WaitCondition::FALLBACK_ORDER {
        match page.navigate(url, wait, timeout) {
            Ok(()) => {
                debug!(url, %wait, "navigation succeeded");
                return Ok(wait);
            }
            Err(e) => {
                warn!(url, %wait, "navigation failed: {}", e);
                last_error = Some(e);
            }
        }
    }

    Err(match last_error {
        Some(e) => NavigationError::classify(&e),
        None => NavigationError::Failed("Failed to navigate to page".into()),
    })
}
