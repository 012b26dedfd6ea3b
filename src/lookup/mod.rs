//! IP lookups.
//!
//! This module provides:
//! - `LookupResult` / `LookupFailure`, the outcome of every lookup
//! - `RequestExecutor`, one HTTP attempt with timeout and cancellation
//! - `RetryController`, exponential backoff around the executor
//! - `IpDetails` and helpers that normalize provider payloads for display

mod details;
mod executor;
mod retry;
mod types;

// Re-export public API
pub use details::{
    display_rows, flag_emoji, normalize_location, privacy_summary, IpDetails, UNKNOWN_FLAG,
};
pub use executor::{Execute, RequestExecutor};
pub use retry::RetryController;
pub use types::{body_preview, LookupData, LookupFailure, LookupResult};
