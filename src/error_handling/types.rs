//! Error type definitions.
//!
//! This module defines the lookup failure taxonomy and the error types
//! returned by initialization, tile downloads and settings loading.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for map tile downloads.
#[derive(Error, Debug)]
pub enum TileError {
    /// Tile server answered with a non-200 status.
    #[error("HTTP {0}")]
    Status(u16),

    /// Request could not be sent or the body could not be read.
    #[error("Tile request failed: {0}")]
    Request(#[from] ReqwestError),

    /// Tile could not be written to the cache directory.
    #[error("Failed to write map tile to file: {0}")]
    Io(#[from] std::io::Error),

    /// The refresh cycle that requested the tile was superseded.
    #[error("Tile request cancelled")]
    Cancelled,
}

/// Error types for reading the settings dump.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings file could not be read.
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    /// Settings content is not valid JSON for `WidgetSettings`.
    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Classification of a failed lookup.
///
/// Every failed lookup carries exactly one kind. Only `Timeout` and
/// server-side `Http` failures are worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FailureKind {
    /// The request did not complete within the timeout
    Timeout,
    /// The provider answered with a non-200 status
    Http,
    /// The body was not a JSON object
    Parse,
    /// Well-formed JSON that reports a provider-level failure
    Api,
    /// The request was aborted because a newer refresh superseded it
    Cancelled,
    /// Admission denied by the rate limiter before any network call
    RateLimited,
    /// Invalid configuration (e.g. custom provider without URL)
    Config,
    /// Transport failure without an HTTP status (DNS, refused connection, TLS)
    Network,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailureKind {
    /// Stable lowercase name, suitable for logs and host-side matching.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Http => "http",
            FailureKind::Parse => "parse",
            FailureKind::Api => "api",
            FailureKind::Cancelled => "cancelled",
            FailureKind::RateLimited => "rate-limited",
            FailureKind::Config => "config",
            FailureKind::Network => "network",
        }
    }
}
