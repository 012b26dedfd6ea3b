//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{WidgetSettings, TCP_CONNECT_TIMEOUT_SECS};

/// Initializes the shared HTTP client.
///
/// Creates a `reqwest::Client` configured with:
/// - User-Agent header from settings
/// - Overall timeout from `request-timeout-ms`
/// - A TCP connect timeout, so an unreachable host fails fast instead of
///   hanging in the OS connect call
///
/// Per-request deadlines are still enforced by the request executor; the
/// client timeout is a backstop for tile downloads.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(settings: &WidgetSettings) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let timeout = Duration::from_millis(settings.request_timeout_ms);
    let connect_timeout = Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS).min(timeout);
    let client = ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(connect_timeout)
        .user_agent(settings.user_agent.clone())
        .build()?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_client_with_defaults() {
        let client = init_client(&WidgetSettings::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_init_client_with_short_timeout() {
        let settings = WidgetSettings {
            request_timeout_ms: 50,
            user_agent: "test-agent/0.1".to_string(),
            ..WidgetSettings::default()
        };
        assert!(init_client(&settings).is_ok());
    }
}
