//! ip_finder library: public IP lookup core for a desktop panel widget
//!
//! This library looks up the machine's public IP and its geolocation through
//! rate-limited providers (ipinfo.io, ip-api.com or a custom URL), retries
//! transient failures with exponential backoff, classifies the active network
//! connections into a VPN verdict and keeps a map tile of the location.
//!
//! # Example
//!
//! ```no_run
//! use ip_finder::config::WidgetSettings;
//! use ip_finder::refresh::{IpFinder, NetworkSnapshot, RefreshLookup};
//! use ip_finder::vpn::{Connection, ConnectionState, Connectivity};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let finder = IpFinder::new(WidgetSettings::default())?;
//! let snapshot = NetworkSnapshot::new(
//!     Connectivity::Full,
//!     vec![Connection::new("wg0", "wireguard", ConnectionState::Activated)],
//! );
//!
//! let report = finder.refresh(&snapshot).await;
//! if let RefreshLookup::Completed(result) = &report.lookup {
//!     println!("{:?} (VPN: {})", report.panel_text(), report.verdict.display_name());
//!     println!("success: {}", result.is_success());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

#![warn(missing_docs)]

pub mod config;
pub mod error_handling;
pub mod initialization;
pub mod lookup;
pub mod metrics;
pub mod provider;
pub mod rate_limiter;
pub mod refresh;
pub mod tile;
pub mod vpn;

// Re-export public API
pub use config::{LogFormat, LogLevel, SettingsEffect, SettingsKey, WidgetSettings};
pub use error_handling::{FailureKind, InitializationError, SettingsError, TileError};
pub use lookup::{LookupFailure, LookupResult};
pub use metrics::{MetricEvent, MetricsCollector, MetricsSnapshot};
pub use refresh::{IpFinder, NetworkSnapshot, RefreshLookup, RefreshReport};
