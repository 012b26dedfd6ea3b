//! Per-provider rate limiting.
//!
//! Each provider with a [`RateBudget`](crate::provider::RateBudget) gets its
//! own token bucket, created full on first use. Admission is non-blocking: a
//! request either takes a token now or is rejected.

mod bucket;
mod clock;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use log::debug;

use crate::metrics::{MetricEvent, MetricsCollector};
use crate::provider::{ProviderConfig, ProviderId};

pub use bucket::TokenBucket;
pub use clock::{Clock, ManualClock, MonotonicClock};

/// Token-bucket rate limiter keyed by provider.
pub struct RateLimiter {
    buckets: Mutex<HashMap<ProviderId, TokenBucket>>,
    clock: Arc<dyn Clock>,
    metrics: Arc<MetricsCollector>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("RateLimiter")
            .field("buckets", &*buckets)
            .finish()
    }
}

impl RateLimiter {
    /// Creates a limiter on the monotonic clock.
    pub fn new(metrics: Arc<MetricsCollector>) -> Self {
        Self::with_clock(metrics, Arc::new(MonotonicClock::default()))
    }

    /// Creates a limiter on a caller-supplied clock.
    pub fn with_clock(metrics: Arc<MetricsCollector>, clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            clock,
            metrics,
        }
    }

    /// Tries to admit one request to `config`'s provider.
    ///
    /// Providers without a budget are always admitted. A rejection is
    /// recorded as [`MetricEvent::RateLimited`].
    pub fn try_acquire(&self, config: &ProviderConfig) -> bool {
        let Some(budget) = config.rate_budget else {
            return true;
        };
        let id = config.id();
        let now = self.clock.now_ms();

        let (allowed, remaining) = {
            let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
            let bucket = buckets
                .entry(id)
                .or_insert_with(|| TokenBucket::new(budget, now));
            let allowed = bucket.try_remove_token(now);
            (allowed, bucket.remaining(now))
        };

        debug!(
            "TokenBucket check for {}: {} (remaining tokens: {:.2})",
            id,
            if allowed { "Allowed" } else { "Rejected" },
            remaining
        );

        if !allowed {
            self.metrics.record(MetricEvent::RateLimited);
        }
        allowed
    }

    /// Tokens left for a provider, `None` if it has not been used yet.
    pub fn remaining(&self, id: ProviderId) -> Option<f64> {
        let now = self.clock.now_ms();
        let mut buckets = self.buckets.lock().unwrap_or_else(PoisonError::into_inner);
        buckets.get_mut(&id).map(|bucket| bucket.remaining(now))
    }

    /// Shared metrics collector.
    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }
}
