//! Configuration types.
//!
//! `WidgetSettings` mirrors the key/value settings the host keeps for the
//! widget. Keys use the host's kebab-case names so a settings dump can be
//! deserialized directly.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, EnumIter, EnumString};

use crate::config::constants::{
    DEFAULT_MAP_CACHE_DIR, DEFAULT_TILE_ZOOM, DEFAULT_USER_AGENT, DEFAULT_VPN_CONNECTION_TYPES,
    MAX_TILE_ZOOM, MIN_TILE_ZOOM, REQUEST_TIMEOUT_MS,
};
use crate::error_handling::SettingsError;
use crate::provider::ProviderId;
use crate::vpn::VpnVerdict;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    #[default]
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    #[default]
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Widget settings consumed by the lookup core.
///
/// # Examples
///
/// ```
/// use ip_finder::config::WidgetSettings;
/// use ip_finder::provider::ProviderId;
///
/// let settings = WidgetSettings::from_json_str(
///     r#"{"api-service": "ip-api-com", "tile-zoom": 11}"#,
/// ).unwrap();
/// assert_eq!(settings.api_service, ProviderId::IpApiCom);
/// assert_eq!(settings.tile_zoom(), 11);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WidgetSettings {
    /// Selected geolocation provider
    pub api_service: ProviderId,

    /// URL template used when `api_service` is `custom` (`%s` = queried IP)
    pub custom_api_url: String,

    /// Map tile zoom level (clamped to 7..=13 on use)
    pub tile_zoom: u8,

    /// Connection type names treated as VPNs
    pub vpn_connection_types: Vec<String>,

    /// Connection ids treated as VPNs regardless of their type
    pub vpn_connections_whitelist: Vec<String>,

    /// Only show VPN status while a VPN is active
    pub vpn_status_only_when_on: bool,

    /// Directory holding the cached map tile
    pub map_cache_dir: PathBuf,

    /// Per-attempt request timeout in milliseconds
    pub request_timeout_ms: u64,

    /// HTTP User-Agent header value
    pub user_agent: String,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Default for WidgetSettings {
    fn default() -> Self {
        Self {
            api_service: ProviderId::IpInfoIo,
            custom_api_url: String::new(),
            tile_zoom: DEFAULT_TILE_ZOOM,
            vpn_connection_types: DEFAULT_VPN_CONNECTION_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            vpn_connections_whitelist: Vec::new(),
            vpn_status_only_when_on: false,
            map_cache_dir: PathBuf::from(DEFAULT_MAP_CACHE_DIR),
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl WidgetSettings {
    /// Parses settings from a JSON object. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Loads settings from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(SettingsError::from)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_json_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    /// Zoom level clamped to the supported tile range.
    pub fn tile_zoom(&self) -> u8 {
        self.tile_zoom.clamp(MIN_TILE_ZOOM, MAX_TILE_ZOOM)
    }

    /// Whether the host should display VPN status for this verdict.
    pub fn should_show_vpn_status(&self, verdict: &VpnVerdict) -> bool {
        !self.vpn_status_only_when_on || verdict.is_vpn_on
    }
}

/// Settings keys the core reacts to when the host reports a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum SettingsKey {
    /// `api-service`
    ApiService,
    /// `custom-api-url`
    CustomApiUrl,
    /// `tile-zoom`
    TileZoom,
    /// `vpn-connection-types`
    VpnConnectionTypes,
    /// `vpn-connections-whitelist`
    VpnConnectionsWhitelist,
    /// `vpn-status-only-when-on`
    VpnStatusOnlyWhenOn,
}

/// What the host should do after a settings change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsEffect {
    /// Start a new refresh cycle
    Refresh,
    /// Re-evaluate VPN widget visibility with the current verdict
    UpdateVisibility,
    /// Nothing now; the value is picked up on the next refresh
    NextRefresh,
}

impl SettingsKey {
    /// Effect of a change to this key.
    pub fn effect(self) -> SettingsEffect {
        match self {
            SettingsKey::ApiService
            | SettingsKey::TileZoom
            | SettingsKey::VpnConnectionTypes
            | SettingsKey::VpnConnectionsWhitelist => SettingsEffect::Refresh,
            SettingsKey::VpnStatusOnlyWhenOn => SettingsEffect::UpdateVisibility,
            SettingsKey::CustomApiUrl => SettingsEffect::NextRefresh,
        }
    }
}
