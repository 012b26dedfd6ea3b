//! Widget configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, retry tuning, provider endpoints, etc.)
//! - The `WidgetSettings` key/value surface owned by the host
//! - Settings change keys and their effect on the refresh cycle

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{LogFormat, LogLevel, SettingsEffect, SettingsKey, WidgetSettings};
