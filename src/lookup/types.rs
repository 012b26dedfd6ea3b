//! Lookup result types.

use serde_json::{Map, Value};

use crate::error_handling::{is_retriable, FailureKind};

/// Provider payload: a JSON object.
pub type LookupData = Map<String, Value>;

/// Why a lookup failed.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupFailure {
    /// Failure category
    pub kind: FailureKind,
    /// Human-readable message shown to the user
    pub message: String,
    /// HTTP status, for `Http` failures
    pub status: Option<u16>,
}

impl LookupFailure {
    /// Failure of `kind` without an HTTP status.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    /// Attempt exceeded `timeout_ms`.
    pub fn timeout(timeout_ms: u64) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("Request timed out after {}ms", timeout_ms),
        )
    }

    /// Attempt aborted by its cancellation token.
    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "Request cancelled")
    }

    /// Rejected locally by the token bucket.
    pub fn rate_limited() -> Self {
        Self::new(FailureKind::RateLimited, "API rate limit exceeded")
    }

    /// Body was not a JSON object.
    pub fn parse() -> Self {
        Self::new(FailureKind::Parse, "Failed to parse JSON response")
    }

    /// Non-200 answer; `body_preview` is already truncated.
    pub fn http(status: u16, body_preview: &str) -> Self {
        Self {
            kind: FailureKind::Http,
            message: format!("HTTP {}: {}", status, body_preview),
            status: Some(status),
        }
    }

    /// Whether another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        is_retriable(self.kind, self.status)
    }
}

impl std::fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Outcome of a lookup: data or a classified failure, never both.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    /// Provider answered with usable data
    Success {
        /// Decoded JSON object
        data: LookupData,
    },
    /// Classified failure
    Failure(LookupFailure),
}

impl LookupResult {
    /// Successful result carrying `data`.
    pub fn success(data: LookupData) -> Self {
        LookupResult::Success { data }
    }

    /// Failed result.
    pub fn failure(failure: LookupFailure) -> Self {
        LookupResult::Failure(failure)
    }

    /// Whether the lookup returned data.
    pub fn is_success(&self) -> bool {
        matches!(self, LookupResult::Success { .. })
    }

    /// Payload of a successful lookup.
    pub fn data(&self) -> Option<&LookupData> {
        match self {
            LookupResult::Success { data } => Some(data),
            LookupResult::Failure(_) => None,
        }
    }

    /// Failure of an unsuccessful lookup.
    pub fn failure_ref(&self) -> Option<&LookupFailure> {
        match self {
            LookupResult::Success { .. } => None,
            LookupResult::Failure(failure) => Some(failure),
        }
    }

    /// Failure kind, `None` on success.
    pub fn kind(&self) -> Option<FailureKind> {
        self.failure_ref().map(|f| f.kind)
    }
}

impl From<LookupFailure> for LookupResult {
    fn from(failure: LookupFailure) -> Self {
        LookupResult::Failure(failure)
    }
}

/// Truncates `body` to at most `max_chars` characters (not bytes).
pub fn body_preview(body: &str, max_chars: usize) -> &str {
    match body.char_indices().nth(max_chars) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_failure_message() {
        let failure = LookupFailure::http(503, "Service Unavailable");
        assert_eq!(failure.message, "HTTP 503: Service Unavailable");
        assert_eq!(failure.status, Some(503));
        assert!(failure.is_retryable());
        assert!(!LookupFailure::http(404, "").is_retryable());
    }

    #[test]
    fn test_failure_constructors() {
        assert!(LookupFailure::timeout(10_000).is_retryable());
        assert_eq!(
            LookupFailure::timeout(10_000).message,
            "Request timed out after 10000ms"
        );
        assert!(!LookupFailure::cancelled().is_retryable());
        assert!(!LookupFailure::parse().is_retryable());
        assert_eq!(
            LookupFailure::rate_limited().message,
            "API rate limit exceeded"
        );
    }

    #[test]
    fn test_result_accessors() {
        let mut data = LookupData::new();
        data.insert("ip".to_string(), Value::from("1.2.3.4"));
        let ok = LookupResult::success(data);
        assert!(ok.is_success());
        assert_eq!(ok.kind(), None);
        assert_eq!(ok.data().unwrap()["ip"], "1.2.3.4");

        let err: LookupResult = LookupFailure::parse().into();
        assert!(!err.is_success());
        assert!(err.data().is_none());
        assert_eq!(err.kind(), Some(FailureKind::Parse));
        assert_eq!(
            err.failure_ref().unwrap().to_string(),
            "[parse] Failed to parse JSON response"
        );
    }

    #[test]
    fn test_body_preview_counts_chars() {
        let body = "x".repeat(250);
        assert_eq!(body_preview(&body, 100).len(), 100);
        assert_eq!(body_preview("short", 100), "short");
        // Multi-byte characters are never split
        let umlauts = "ä".repeat(150);
        assert_eq!(body_preview(&umlauts, 100).chars().count(), 100);
    }
}
