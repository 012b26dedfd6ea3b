//! Token bucket.

use crate::provider::RateBudget;

/// Token bucket holding up to `capacity` tokens, refilled continuously.
///
/// Tokens are fractional: a budget of 45 per 60s regains 0.00075 tokens per
/// millisecond. A request needs one whole token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_ms: f64,
    last_refill_ms: u64,
}

impl TokenBucket {
    /// Creates a full bucket for `budget`, starting at `now_ms`.
    pub fn new(budget: RateBudget, now_ms: u64) -> Self {
        let capacity = f64::from(budget.max_requests);
        Self {
            capacity,
            tokens: capacity,
            refill_per_ms: budget.refill_per_ms(),
            last_refill_ms: now_ms,
        }
    }

    fn refill(&mut self, now_ms: u64) {
        // A clock that went backwards refills nothing
        let elapsed = now_ms.saturating_sub(self.last_refill_ms);
        if elapsed > 0 {
            #[allow(clippy::cast_precision_loss)]
            let regained = elapsed as f64 * self.refill_per_ms;
            self.tokens = (self.tokens + regained).min(self.capacity);
        }
        self.last_refill_ms = self.last_refill_ms.max(now_ms);
    }

    /// Refills, then takes one token if available.
    pub fn try_remove_token(&mut self, now_ms: u64) -> bool {
        self.refill(now_ms);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens available at `now_ms`, without consuming any.
    pub fn remaining(&mut self, now_ms: u64) -> f64 {
        self.refill(now_ms);
        self.tokens
    }

    /// Maximum token count.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn budget(max: u32, window_ms: u64) -> RateBudget {
        RateBudget::new(max, Duration::from_millis(window_ms))
    }

    #[test]
    fn test_new_bucket_is_full() {
        let mut bucket = TokenBucket::new(budget(3, 1000), 0);
        assert_eq!(bucket.remaining(0), 3.0);
        assert_eq!(bucket.capacity(), 3.0);
    }

    #[test]
    fn test_drains_then_rejects() {
        let mut bucket = TokenBucket::new(budget(2, 1000), 0);
        assert!(bucket.try_remove_token(0));
        assert!(bucket.try_remove_token(0));
        assert!(!bucket.try_remove_token(0));
    }

    #[test]
    fn test_partial_refill() {
        let mut bucket = TokenBucket::new(budget(2, 1000), 0);
        assert!(bucket.try_remove_token(0));
        assert!(bucket.try_remove_token(0));
        // Half a window regains one token
        assert!(!bucket.try_remove_token(499));
        assert!(bucket.try_remove_token(510));
        assert!(!bucket.try_remove_token(510));
    }

    #[test]
    fn test_refill_is_capped_at_capacity() {
        let mut bucket = TokenBucket::new(budget(5, 1000), 0);
        assert!(bucket.try_remove_token(0));
        assert_eq!(bucket.remaining(1_000_000), 5.0);
    }

    #[test]
    fn test_backwards_clock_refills_nothing() {
        let mut bucket = TokenBucket::new(budget(1, 1000), 5000);
        assert!(bucket.try_remove_token(5000));
        assert!(!bucket.try_remove_token(1000));
        // Progress is measured from the latest time seen
        assert!(!bucket.try_remove_token(5999));
        assert!(bucket.try_remove_token(6010));
    }
}
