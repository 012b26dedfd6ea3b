//! Bounded exponential backoff around an [`Execute`] implementation.

use std::sync::Arc;

use log::{info, warn};
use tokio_util::sync::CancellationToken;

use super::executor::{Execute, RequestExecutor};
use super::types::{LookupFailure, LookupResult};
use crate::config::RETRY_MAX_ATTEMPTS;
use crate::error_handling::get_retry_strategy;
use crate::metrics::{MetricEvent, MetricsCollector};
use crate::provider::{LookupRequest, ProviderConfig};

/// Retries timeouts and 5xx answers with exponential backoff.
///
/// No delay precedes the first attempt. The backoff sleep is cancellable:
/// cancellation while waiting ends the lookup with a `Cancelled` failure.
#[derive(Debug)]
pub struct RetryController<E = RequestExecutor> {
    executor: E,
    metrics: Arc<MetricsCollector>,
    max_attempts: usize,
}

impl<E: Execute> RetryController<E> {
    /// Controller with the default attempt limit.
    pub fn new(executor: E, metrics: Arc<MetricsCollector>) -> Self {
        Self {
            executor,
            metrics,
            max_attempts: RETRY_MAX_ATTEMPTS,
        }
    }

    /// Sets the attempt limit (first attempt included, at least 1).
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Attempts per lookup, including the first.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// The wrapped executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Runs the lookup, retrying retryable failures.
    ///
    /// Returns the first success, the first non-retryable failure, or the
    /// last failure once attempts are exhausted.
    pub async fn execute_with_retry(
        &self,
        config: &ProviderConfig,
        request: &LookupRequest,
        cancel: &CancellationToken,
    ) -> LookupResult {
        let mut delays = get_retry_strategy(self.max_attempts);
        let mut attempt = 1;

        loop {
            let result = self.executor.execute(config, request, cancel).await;
            let failure = match &result {
                LookupResult::Success { .. } => return result,
                LookupResult::Failure(failure) => failure,
            };
            if !failure.is_retryable() {
                return result;
            }
            let Some(delay) = delays.next() else {
                warn!(
                    "Giving up on {} after {} attempts: {}",
                    config.id(),
                    attempt,
                    failure
                );
                return result;
            };

            self.metrics.record(MetricEvent::Retried);
            info!(
                "Retrying {} (attempt {}/{}) in {}ms after: {}",
                config.id(),
                attempt + 1,
                self.max_attempts,
                delay.as_millis(),
                failure
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return LookupFailure::cancelled().into(),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::FailureKind;
    use crate::lookup::LookupData;
    use crate::provider::{ProviderId, ProviderRegistry};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Plays back scripted results; repeats the last one when exhausted.
    struct ScriptedExecutor {
        script: Mutex<VecDeque<LookupResult>>,
        calls: AtomicUsize,
    }

    impl ScriptedExecutor {
        fn new(script: Vec<LookupResult>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Execute for ScriptedExecutor {
        async fn execute(
            &self,
            _config: &ProviderConfig,
            _request: &LookupRequest,
            _cancel: &CancellationToken,
        ) -> LookupResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front().unwrap()
            } else {
                script.front().cloned().unwrap()
            }
        }
    }

    fn controller(script: Vec<LookupResult>) -> (RetryController<ScriptedExecutor>, Arc<MetricsCollector>) {
        let metrics = Arc::new(MetricsCollector::new());
        let controller = RetryController::new(ScriptedExecutor::new(script), Arc::clone(&metrics));
        (controller, metrics)
    }

    fn config() -> ProviderConfig {
        ProviderRegistry::new(false).get(ProviderId::IpInfoIo)
    }

    fn ok() -> LookupResult {
        let mut data = LookupData::new();
        data.insert("ip".to_string(), "1.2.3.4".into());
        LookupResult::success(data)
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_errors_exhaust_attempts_with_backoff() {
        let (controller, metrics) = controller(vec![LookupFailure::http(503, "busy").into()]);
        let start = tokio::time::Instant::now();
        let result = controller
            .execute_with_retry(&config(), &LookupRequest::own_ip(), &CancellationToken::new())
            .await;

        assert_eq!(controller.executor().calls(), 3);
        assert_eq!(result.failure_ref().unwrap().status, Some(503));
        // 1000ms + 2000ms
        assert_eq!(start.elapsed(), Duration::from_millis(3000));
        assert_eq!(metrics.get_count(MetricEvent::Retried), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_timeout() {
        let (controller, metrics) = controller(vec![LookupFailure::timeout(10_000).into(), ok()]);
        let start = tokio::time::Instant::now();
        let result = controller
            .execute_with_retry(&config(), &LookupRequest::own_ip(), &CancellationToken::new())
            .await;

        assert!(result.is_success());
        assert_eq!(controller.executor().calls(), 2);
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
        assert_eq!(metrics.get_count(MetricEvent::Retried), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_failures_return_immediately() {
        for failure in [
            LookupFailure::parse(),
            LookupFailure::http(404, "Not Found"),
            LookupFailure::new(FailureKind::Api, "invalid query"),
            LookupFailure::cancelled(),
            LookupFailure::new(FailureKind::Network, "connection refused"),
        ] {
            let kind = failure.kind;
            let (controller, metrics) = controller(vec![failure.into()]);
            let start = tokio::time::Instant::now();
            let result = controller
                .execute_with_retry(&config(), &LookupRequest::own_ip(), &CancellationToken::new())
                .await;
            assert_eq!(result.kind(), Some(kind));
            assert_eq!(controller.executor().calls(), 1, "{} was retried", kind);
            assert_eq!(start.elapsed(), Duration::ZERO);
            assert_eq!(metrics.get_count(MetricEvent::Retried), 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let (controller, _metrics) = controller(vec![LookupFailure::http(500, "").into()]);
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            canceller.cancel();
        });

        let start = tokio::time::Instant::now();
        let result = controller
            .execute_with_retry(&config(), &LookupRequest::own_ip(), &cancel)
            .await;

        assert_eq!(result.kind(), Some(FailureKind::Cancelled));
        assert_eq!(controller.executor().calls(), 1);
        assert!(start.elapsed() < Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_limit() {
        let (controller, _metrics) = controller(vec![LookupFailure::timeout(10).into()]);
        let controller = controller.with_max_attempts(0);
        assert_eq!(controller.max_attempts(), 1);
        let result = controller
            .execute_with_retry(&config(), &LookupRequest::own_ip(), &CancellationToken::new())
            .await;
        assert_eq!(result.kind(), Some(FailureKind::Timeout));
        assert_eq!(controller.executor().calls(), 1);
    }
}
