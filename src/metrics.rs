//! Lookup metrics.
//!
//! Lock-free counters for requests, successes, failures, retries and
//! rate-limit rejections. The rejection counter is the only one that resets:
//! reaching the alert threshold fires the alert callback and restarts the
//! count at zero.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::error;
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;

use crate::config::RATE_LIMIT_ALERT_THRESHOLD;

/// Events counted by the [`MetricsCollector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum MetricEvent {
    /// A provider request was issued
    Requested,
    /// A provider request returned usable data
    Succeeded,
    /// A provider request failed (any classification)
    Failed,
    /// A failed request is about to be retried
    Retried,
    /// The rate limiter denied admission
    RateLimited,
}

/// Payload handed to the alert callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitAlert {
    /// Rejections counted since the previous alert
    pub rate_limit_rejections: usize,
}

/// Callback invoked when the rate-limit rejection threshold is reached.
pub type AlertCallback = Box<dyn Fn(&RateLimitAlert) + Send + Sync>;

/// Point-in-time copy of all counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Attempts sent to a provider
    pub total_requests: usize,
    /// Attempts that returned data
    pub successful_requests: usize,
    /// Attempts that failed, cancellations included
    pub failed_requests: usize,
    /// Retries scheduled after a failed attempt
    pub retries: usize,
    /// Rejections since the last alert
    pub rate_limit_rejections: usize,
    /// Rate-limit alerts fired so far
    pub alerts_raised: usize,
}

/// Thread-safe lookup metrics.
///
/// Shared between the rate limiter, the request executor and the retry
/// controller via `Arc`.
pub struct MetricsCollector {
    counters: HashMap<MetricEvent, AtomicUsize>,
    alerts_raised: AtomicUsize,
    alert_threshold: usize,
    on_alert: AlertCallback,
}

impl std::fmt::Debug for MetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsCollector")
            .field("snapshot", &self.snapshot())
            .field("alert_threshold", &self.alert_threshold)
            .finish()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Creates a collector that logs alerts at error level.
    pub fn new() -> Self {
        Self::with_alert(
            RATE_LIMIT_ALERT_THRESHOLD,
            Box::new(|alert: &RateLimitAlert| {
                error!(
                    "[ALERT] High number of rate limit rejections: {}",
                    alert.rate_limit_rejections
                );
            }),
        )
    }

    /// Creates a collector with a custom threshold and alert callback.
    pub fn with_alert(alert_threshold: usize, on_alert: AlertCallback) -> Self {
        let mut counters = HashMap::new();
        for event in MetricEvent::iter() {
            counters.insert(event, AtomicUsize::new(0));
        }
        MetricsCollector {
            counters,
            alerts_raised: AtomicUsize::new(0),
            alert_threshold: alert_threshold.max(1),
            on_alert,
        }
    }

    /// Records one occurrence of `event`.
    pub fn record(&self, event: MetricEvent) {
        let Some(counter) = self.counters.get(&event) else {
            log::error!(
                "Attempted to record {:?} which is not in the counter map. \
                 This indicates a bug in MetricsCollector initialization.",
                event
            );
            return;
        };

        if event != MetricEvent::RateLimited {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }

        // Increment and reset in one atomic step so concurrent rejections
        // cannot fire the alert twice.
        let threshold = self.alert_threshold;
        let previous = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(if n + 1 >= threshold { 0 } else { n + 1 })
            })
            .unwrap_or_default();
        if previous + 1 >= threshold {
            self.alerts_raised.fetch_add(1, Ordering::SeqCst);
            (self.on_alert)(&RateLimitAlert {
                rate_limit_rejections: previous + 1,
            });
        }
    }

    /// Current value of one counter.
    pub fn get_count(&self, event: MetricEvent) -> usize {
        self.counters
            .get(&event)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Number of alerts fired so far.
    pub fn alerts_raised(&self) -> usize {
        self.alerts_raised.load(Ordering::SeqCst)
    }

    /// Copies all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.get_count(MetricEvent::Requested),
            successful_requests: self.get_count(MetricEvent::Succeeded),
            failed_requests: self.get_count(MetricEvent::Failed),
            retries: self.get_count(MetricEvent::Retried),
            rate_limit_rejections: self.get_count(MetricEvent::RateLimited),
            alerts_raised: self.alerts_raised(),
        }
    }
}
