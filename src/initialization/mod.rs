//! Shared resource setup.
//!
//! This module provides functions to initialize:
//! - The logger (plain colored output or JSON lines)
//! - The HTTP client shared by provider lookups and tile downloads
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

// Re-export public API
pub use client::init_client;
pub use logger::{init_logger_from_settings, init_logger_with};
