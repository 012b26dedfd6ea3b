//! Single provider request.
//!
//! One GET with a hard timeout, raced against the refresh cycle's
//! cancellation token. The losing branch is dropped, which aborts the socket
//! or releases the timer. Every outcome is classified into a
//! [`LookupResult`]; nothing here returns `Err`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::types::{body_preview, LookupData, LookupFailure, LookupResult};
use crate::config::{WidgetSettings, ERROR_BODY_PREVIEW_CHARS};
use crate::error_handling::{categorize_reqwest_error, FailureKind, InitializationError};
use crate::initialization::init_client;
use crate::metrics::{MetricEvent, MetricsCollector};
use crate::provider::{LookupRequest, ProviderConfig};

/// Something that performs one lookup attempt.
///
/// [`RequestExecutor`] is the HTTP implementation; the retry controller and
/// the refresh orchestrator are generic over this trait so they can be
/// driven by scripted executors in tests.
pub trait Execute: Send + Sync {
    /// Runs one attempt. Must resolve to a `Cancelled` failure promptly once
    /// `cancel` fires.
    fn execute(
        &self,
        config: &ProviderConfig,
        request: &LookupRequest,
        cancel: &CancellationToken,
    ) -> impl Future<Output = LookupResult> + Send;
}

/// HTTP request executor.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Arc<reqwest::Client>,
    timeout: Duration,
    user_agent: String,
    metrics: Arc<MetricsCollector>,
}

impl RequestExecutor {
    /// Executor sharing `client`; each attempt is bounded by `timeout`.
    pub fn new(
        client: Arc<reqwest::Client>,
        timeout: Duration,
        user_agent: impl Into<String>,
        metrics: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            client,
            timeout,
            user_agent: user_agent.into(),
            metrics,
        }
    }

    /// Builds an executor with its own HTTP client from `settings`.
    ///
    /// # Errors
    ///
    /// Returns `InitializationError::HttpClientError` if the client cannot be
    /// built.
    pub fn from_settings(
        settings: &WidgetSettings,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self, InitializationError> {
        let client = init_client(settings)?;
        Ok(Self::new(
            client,
            Duration::from_millis(settings.request_timeout_ms),
            settings.user_agent.clone(),
            metrics,
        ))
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    fn transport_failure(&self, error: &reqwest::Error) -> LookupFailure {
        match categorize_reqwest_error(error) {
            FailureKind::Timeout => LookupFailure::timeout(self.timeout_ms()),
            kind => LookupFailure {
                kind,
                message: error.to_string(),
                status: error.status().map(|s| s.as_u16()),
            },
        }
    }

    async fn fetch(&self, config: &ProviderConfig, url: &str) -> Result<LookupData, LookupFailure> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| self.transport_failure(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_failure(&e))?;

        if status != StatusCode::OK {
            return Err(LookupFailure::http(
                status.as_u16(),
                body_preview(&body, ERROR_BODY_PREVIEW_CHARS),
            ));
        }

        let data = match serde_json::from_str::<Value>(&body) {
            Ok(Value::Object(data)) => data,
            Ok(_) | Err(_) => return Err(LookupFailure::parse()),
        };

        if config.reports_status() && data.get("status").and_then(Value::as_str) == Some("fail") {
            let message = data
                .get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or("API error");
            return Err(LookupFailure::new(FailureKind::Api, message));
        }

        Ok(data)
    }
}

impl Execute for RequestExecutor {
    async fn execute(
        &self,
        config: &ProviderConfig,
        request: &LookupRequest,
        cancel: &CancellationToken,
    ) -> LookupResult {
        let url = config.build_url(request);
        debug!(
            "Requesting {} via {}",
            config.redacted_url(request),
            config.id()
        );
        self.metrics.record(MetricEvent::Requested);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LookupFailure::cancelled()),
            result = tokio::time::timeout(self.timeout, self.fetch(config, &url)) => {
                result.unwrap_or_else(|_| Err(LookupFailure::timeout(self.timeout_ms())))
            }
        };

        match outcome {
            Ok(data) => {
                self.metrics.record(MetricEvent::Succeeded);
                LookupResult::success(data)
            }
            Err(failure) => {
                self.metrics.record(MetricEvent::Failed);
                if failure.kind == FailureKind::Cancelled {
                    debug!("Request to {} cancelled", config.id());
                } else {
                    warn!("Request to {} failed: {}", config.id(), failure);
                }
                LookupResult::failure(failure)
            }
        }
    }
}
