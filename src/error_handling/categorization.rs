//! Error categorization and retry strategy.
//!
//! This module provides functions to categorize errors and configure retry strategies.

use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;

use super::types::FailureKind;
use crate::config::{RETRY_BASE_BACKOFF_MS, RETRY_FACTOR, RETRY_MAX_BACKOFF_MS};

/// Creates the exponential backoff schedule for provider lookups.
///
/// Yields the delay to wait before each retry:
/// `min(RETRY_BASE_BACKOFF_MS * 2^(retry-1), RETRY_MAX_BACKOFF_MS)`, i.e.
/// 1000ms, 2000ms, 4000ms, 8000ms, 10000ms, ...
///
/// The iterator is limited to `max_attempts - 1` items: the first attempt is
/// never delayed.
pub fn get_retry_strategy(max_attempts: usize) -> impl Iterator<Item = Duration> {
    // ExponentialBackoff yields factor * base^n for n = 1, 2, ...
    ExponentialBackoff::from_millis(RETRY_FACTOR)
        .factor(RETRY_BASE_BACKOFF_MS / RETRY_FACTOR)
        .max_delay(Duration::from_millis(RETRY_MAX_BACKOFF_MS))
        .take(max_attempts.saturating_sub(1))
}

/// Categorizes a `reqwest::Error` into a `FailureKind`.
///
/// Status errors map to `Http`, timeouts to `Timeout`, body decode errors to
/// `Parse`. Everything else is a transport-level `Network` failure.
pub fn categorize_reqwest_error(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        FailureKind::Timeout
    } else if error.status().is_some() {
        FailureKind::Http
    } else if error.is_decode() {
        FailureKind::Parse
    } else {
        FailureKind::Network
    }
}

/// Determines if a failure is retriable.
///
/// # Retriable
///
/// - Timeouts
/// - Server errors (5xx HTTP status codes)
///
/// # Non-Retriable
///
/// - Client errors (4xx), parse and provider-level API failures: retrying
///   returns the same answer
/// - Cancellation, rate limiting and configuration failures
/// - Transport failures without a status
pub fn is_retriable(kind: FailureKind, status: Option<u16>) -> bool {
    match kind {
        FailureKind::Timeout => true,
        FailureKind::Http => status.is_some_and(|code| (500..600).contains(&code)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_retry_strategy_initial_delay() {
        let first_delay = get_retry_strategy(3).next().unwrap();
        assert_eq!(first_delay, Duration::from_millis(RETRY_BASE_BACKOFF_MS));
    }

    #[test]
    fn test_get_retry_strategy_doubles_until_cap() {
        let delays: Vec<u128> = get_retry_strategy(7).map(|d| d.as_millis()).collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 10_000, 10_000]);
    }

    #[test]
    fn test_get_retry_strategy_max_delay() {
        for delay in get_retry_strategy(20) {
            assert!(
                delay.as_millis() <= RETRY_MAX_BACKOFF_MS as u128,
                "Delay {}ms exceeds max {}ms",
                delay.as_millis(),
                RETRY_MAX_BACKOFF_MS
            );
        }
    }

    #[test]
    fn test_get_retry_strategy_max_attempts() {
        assert_eq!(get_retry_strategy(3).count(), 2);
        assert_eq!(get_retry_strategy(1).count(), 0);
        assert_eq!(get_retry_strategy(0).count(), 0);
    }

    #[test]
    fn test_is_retriable() {
        assert!(is_retriable(FailureKind::Timeout, None));
        assert!(is_retriable(FailureKind::Http, Some(500)));
        assert!(is_retriable(FailureKind::Http, Some(503)));
        assert!(!is_retriable(FailureKind::Http, Some(404)));
        assert!(!is_retriable(FailureKind::Http, Some(429)));
        assert!(!is_retriable(FailureKind::Http, None));
        assert!(!is_retriable(FailureKind::Parse, None));
        assert!(!is_retriable(FailureKind::Api, None));
        assert!(!is_retriable(FailureKind::Cancelled, None));
        assert!(!is_retriable(FailureKind::RateLimited, None));
        assert!(!is_retriable(FailureKind::Config, None));
        assert!(!is_retriable(FailureKind::Network, None));
    }

    // categorize_reqwest_error needs real reqwest::Error instances; it is
    // covered by the wiremock-backed tests in tests/lookup_integration.rs.
}
