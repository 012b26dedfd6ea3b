//! Error handling.
//!
//! This module provides:
//! - The lookup failure taxonomy (`FailureKind`)
//! - Error types for initialization, tile downloads and settings loading
//! - Error categorization and retriability rules
//! - Retry strategy configuration

mod categorization;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, get_retry_strategy, is_retriable};
pub use types::{FailureKind, InitializationError, SettingsError, TileError};
